/// The container format of a source, implied by the extension of its url.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
	/// HTTP Live Streaming (`.m3u8`)
	Hls,
	/// Flash video over http (`.flv`)
	Flv,
	/// Anything else, handed to the media element as is.
	Other,
}

impl SourceFormat {
	pub fn from_url(url: &str) -> Self {
		let path = url.split(['?', '#']).next().unwrap_or_default();
		let file = path.rsplit('/').next().unwrap_or_default();

		match file.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).as_deref() {
			Some("m3u8") => Self::Hls,
			Some("flv") => Self::Flv,
			_ => Self::Other,
		}
	}

	pub fn is_hls(self) -> bool {
		matches!(self, Self::Hls)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Hls => "hls",
			Self::Flv => "flv",
			Self::Other => "other",
		}
	}
}

impl std::fmt::Display for SourceFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A user selectable stream line.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StreamSource {
	#[serde(default)]
	pub name: String,
	pub url: String,
	/// Only used when the browser cannot play the format of `url`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fallback: Option<String>,
}

impl StreamSource {
	pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			url: url.into(),
			fallback: None,
		}
	}

	pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
		self.fallback = Some(fallback.into());
		self
	}

	pub fn format(&self) -> SourceFormat {
		SourceFormat::from_url(&self.url)
	}

	pub fn fallback_format(&self) -> Option<SourceFormat> {
		self.fallback.as_deref().map(SourceFormat::from_url)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
	#[error("no stream lines configured")]
	Empty,
	#[error("line {index} has an empty url")]
	EmptyUrl { index: usize },
	#[error("line {index} has an empty fallback url")]
	EmptyFallback { index: usize },
}

/// The validated, ordered list of configured lines.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<StreamSource>", into = "Vec<StreamSource>")]
pub struct StreamLines(Vec<StreamSource>);

impl StreamLines {
	pub fn new(lines: Vec<StreamSource>) -> Result<Self, LineError> {
		if lines.is_empty() {
			return Err(LineError::Empty);
		}

		let lines = lines
			.into_iter()
			.enumerate()
			.map(|(index, mut line)| {
				line.url = line.url.trim().to_string();
				if line.url.is_empty() {
					return Err(LineError::EmptyUrl { index });
				}

				if let Some(fallback) = line.fallback.as_mut() {
					*fallback = fallback.trim().to_string();
					if fallback.is_empty() {
						return Err(LineError::EmptyFallback { index });
					}
				}

				if line.name.trim().is_empty() {
					line.name = format!("Line {}", index + 1);
				}

				Ok(line)
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self(lines))
	}

	pub fn first(&self) -> Option<&StreamSource> {
		self.0.first()
	}

	/// Finds the line that owns `url`, either as its primary or its fallback source.
	pub fn find(&self, url: &str) -> Option<&StreamSource> {
		self.0
			.iter()
			.find(|line| line.url == url)
			.or_else(|| self.0.iter().find(|line| line.fallback.as_deref() == Some(url)))
	}

	pub fn iter(&self) -> impl Iterator<Item = &StreamSource> {
		self.0.iter()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl TryFrom<Vec<StreamSource>> for StreamLines {
	type Error = LineError;

	fn try_from(value: Vec<StreamSource>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl From<StreamLines> for Vec<StreamSource> {
	fn from(value: StreamLines) -> Self {
		value.0
	}
}
