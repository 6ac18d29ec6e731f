use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::conversion::parameter::{ParameterPosition, ParameterSet};
use crate::conversion::time::format_time;
use crate::media::SubtitleStreamInfo;

/// A subtitle stream, either inside a container or a standalone file.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleStream {
    index: usize,
    path: PathBuf,
    codec: String,
    language: Option<String>,
    parameters: ParameterSet,
}

impl SubtitleStream {
    pub fn new(path: impl Into<PathBuf>, index: usize) -> Self {
        Self {
            index,
            path: path.into(),
            codec: String::new(),
            language: None,
            parameters: ParameterSet::new(),
        }
    }

    pub fn from_info(path: &Path, info: &SubtitleStreamInfo) -> Self {
        Self {
            codec: info.codec.clone(),
            language: info.language.clone(),
            ..Self::new(path, info.index)
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codec(&self) -> &str {
        &self.codec
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn set_codec(mut self, codec: impl fmt::Display) -> Self {
        self.parameters.replace(
            "-c:s",
            format!("-c:s {}", codec),
            ParameterPosition::PostInput,
        );
        self
    }

    pub fn copy_stream(self) -> Self {
        self.set_codec("copy")
    }

    /// Tags the output stream with an ISO 639 language code.
    pub fn set_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        let flag = format!("-metadata:s:s:{}", self.index);
        self.parameters.replace(
            &flag,
            format!("{} language={}", flag, language),
            ParameterPosition::PostInput,
        );
        self.language = Some(language);
        self
    }

    pub fn split(mut self, start: Duration, duration: Duration) -> Self {
        self.parameters.replace(
            "-ss",
            format!("-ss {} -t {}", format_time(start), format_time(duration)),
            ParameterPosition::PostInput,
        );
        self
    }

    /// Seeks the input; subtitles carry no duration so nothing is validated.
    pub fn set_seek(mut self, seek: Duration) -> Self {
        self.parameters.replace(
            "-ss",
            format!("-ss {}", format_time(seek)),
            ParameterPosition::PreInput,
        );
        self
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn build_parameters(&self, position: ParameterPosition) -> String {
        self.parameters.render(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_and_language() {
        let subtitle = SubtitleStream::new("/subs/movie.srt", 0)
            .set_codec("mov_text")
            .set_language("eng")
            .set_language("ita");
        assert_eq!(
            subtitle.build_parameters(ParameterPosition::PostInput),
            "-c:s mov_text -metadata:s:s:0 language=ita "
        );
        assert_eq!(subtitle.language(), Some("ita"));
    }

    #[test]
    fn test_seek_is_pre_input() {
        let subtitle = SubtitleStream::new("/subs/movie.srt", 0).set_seek(Duration::from_secs(3));
        assert_eq!(
            subtitle.build_parameters(ParameterPosition::PreInput),
            "-ss 00:00:03.000 "
        );
    }
}
