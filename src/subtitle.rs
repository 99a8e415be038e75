use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{Result, RetimeError};

/// SRT timestamp (HH:MM:SS,mmm)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub millis: u32,
}

impl Timestamp {
    pub fn new(hours: u32, minutes: u32, seconds: u32, millis: u32) -> Self {
        Self { hours, minutes, seconds, millis }
    }

    /// Collapse the composite fields into a single seconds value
    pub fn as_secs_f64(&self) -> f64 {
        self.hours as f64 * 3600.0
            + self.minutes as f64 * 60.0
            + self.seconds as f64
            + self.millis as f64 / 1000.0
    }

    /// Parse `HH:MM:SS,mmm`; a `.` is accepted in place of the comma.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (clock, fraction) = s.split_once(|c: char| c == ',' || c == '.')?;

        let mut parts = clock.split(':');
        let hours = parts.next()?.parse().ok()?;
        let minutes: u32 = parts.next()?.parse().ok()?;
        let seconds: u32 = parts.next()?.parse().ok()?;
        if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
            return None;
        }

        if fraction.is_empty() || fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // "5" means 500ms, "05" means 50ms
        let millis = fraction.parse::<u32>().ok()? * 10u32.pow(3 - fraction.len() as u32);

        Some(Self::new(hours, minutes, seconds, millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02},{:03}",
            self.hours, self.minutes, self.seconds, self.millis
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub index: Option<u32>,
    pub start: Timestamp,
    pub end: Timestamp,
    pub text: Vec<String>,
}

/// Cues in file order
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleTrack {
    pub cues: Vec<Cue>,
}

impl SubtitleTrack {
    /// Read and parse an SRT file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RetimeError::MissingInput(path.display().to_string()));
        }

        let bytes = fs::read(path).await?;
        let content = String::from_utf8(bytes).map_err(|_| {
            RetimeError::UnparseableSubtitle(format!("{} is not valid UTF-8", path.display()))
        })?;

        let track = Self::parse(&content)
            .map_err(|e| match e {
                RetimeError::UnparseableSubtitle(msg) => {
                    RetimeError::UnparseableSubtitle(format!("{}: {}", path.display(), msg))
                }
                other => other,
            })?;

        info!("Loaded {} cues from {}", track.cues.len(), path.display());
        Ok(track)
    }

    /// Parse SRT content
    pub fn parse(content: &str) -> Result<Self> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut blocks: Vec<Vec<(usize, &str)>> = Vec::new();
        let mut block: Vec<(usize, &str)> = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                if !block.is_empty() {
                    blocks.push(std::mem::take(&mut block));
                }
            } else {
                block.push((line_no + 1, line));
            }
        }
        if !block.is_empty() {
            blocks.push(block);
        }

        // Malformed blocks are skipped so one broken cue does not sink the track
        let mut cues = Vec::new();
        let mut skipped = 0;
        for block in &blocks {
            match parse_block(block) {
                Ok(cue) => cues.push(cue),
                Err(e) => {
                    warn!("Skipping subtitle block at line {}: {}", block[0].0, e);
                    skipped += 1;
                }
            }
        }

        if cues.is_empty() {
            return Err(RetimeError::UnparseableSubtitle(format!(
                "no cues found ({} malformed blocks)",
                skipped
            )));
        }

        if cues.windows(2).any(|pair| pair[1].start < pair[0].start) {
            warn!("Subtitle cues are not in time order; using file order for the target duration");
        }

        Ok(Self { cues })
    }

    pub fn first_start(&self) -> Timestamp {
        self.cues[0].start
    }

    pub fn last_end(&self) -> Timestamp {
        self.cues[self.cues.len() - 1].end
    }

    /// Seconds between the first cue's start and the last cue's end
    pub fn target_duration(&self) -> f64 {
        self.last_end().as_secs_f64() - self.first_start().as_secs_f64()
    }
}

fn parse_block(block: &[(usize, &str)]) -> Result<Cue> {
    let mut lines = block.iter();
    let (first_no, first) = block[0];

    // Index line is optional
    let index = match first.trim().parse::<u32>() {
        Ok(index) => {
            lines.next();
            Some(index)
        }
        Err(_) => None,
    };

    let (timing_no, timing) = lines.next().ok_or_else(|| {
        RetimeError::UnparseableSubtitle(format!("cue at line {} has no timing line", first_no))
    })?;
    let (start, end) = parse_timing(timing).ok_or_else(|| {
        RetimeError::UnparseableSubtitle(format!("invalid timing line {}: {:?}", timing_no, timing))
    })?;

    let text = lines.map(|(_, line)| line.to_string()).collect();

    Ok(Cue { index, start, end, text })
}

fn parse_timing(line: &str) -> Option<(Timestamp, Timestamp)> {
    let (start, rest) = line.split_once("-->")?;
    // Some encoders append position coordinates after the end time
    let end = rest.split_whitespace().next()?;
    Some((Timestamp::parse(start)?, Timestamp::parse(end)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:03,500\nHola.\n\n2\n00:00:04,000 --> 00:00:06,250\n¿Qué tal?\nBien.\n\n3\n00:00:07,100 --> 00:00:11,000\nAdiós.\n";

    #[test]
    fn test_format_timestamp() {
        assert_eq!(Timestamp::new(0, 0, 0, 0).to_string(), "00:00:00,000");
        assert_eq!(Timestamp::new(0, 1, 5, 123).to_string(), "00:01:05,123");
        assert_eq!(Timestamp::new(1, 1, 1, 500).to_string(), "01:01:01,500");
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(Timestamp::parse("01:02:03,456"), Some(Timestamp::new(1, 2, 3, 456)));
        assert_eq!(Timestamp::parse("00:00:10.5"), Some(Timestamp::new(0, 0, 10, 500)));
        assert_eq!(Timestamp::parse(" 00:00:10,05 "), Some(Timestamp::new(0, 0, 10, 50)));
        assert_eq!(Timestamp::parse("00:61:00,000"), None);
        assert_eq!(Timestamp::parse("00:00:00"), None);
        assert_eq!(Timestamp::parse("aa:00:00,000"), None);
        assert_eq!(Timestamp::parse("00:00:00,1234"), None);
    }

    #[test]
    fn test_timestamp_seconds() {
        let ts = Timestamp::new(1, 2, 3, 456);
        assert!((ts.as_secs_f64() - 3723.456).abs() < 1e-9);
    }

    #[test]
    fn test_parse_track() {
        let track = SubtitleTrack::parse(SAMPLE).unwrap();
        assert_eq!(track.cues.len(), 3);
        assert_eq!(track.cues[1].index, Some(2));
        assert_eq!(track.cues[1].text, vec!["¿Qué tal?", "Bien."]);
        assert_eq!(track.first_start(), Timestamp::new(0, 0, 1, 0));
        assert_eq!(track.last_end(), Timestamp::new(0, 0, 11, 0));
        assert!((track.target_duration() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_duration_ignores_middle_cues() {
        let changed = SAMPLE.replace("00:00:04,000 --> 00:00:06,250", "00:00:02,000 --> 00:00:09,999");
        let a = SubtitleTrack::parse(SAMPLE).unwrap();
        let b = SubtitleTrack::parse(&changed).unwrap();
        assert_ne!(a.cues[1], b.cues[1]);
        assert_eq!(a.target_duration(), b.target_duration());
    }

    #[test]
    fn test_crlf_bom_and_missing_index() {
        let content = "\u{feff}00:00:00,500 --> 00:00:02,000 X1:10 X2:20\r\nline\r\n\r\n\r\n5\r\n00:01:00,000 --> 00:01:30,000\r\nend\r\n";
        let track = SubtitleTrack::parse(content).unwrap();
        assert_eq!(track.cues.len(), 2);
        assert_eq!(track.cues[0].index, None);
        assert_eq!(track.cues[1].index, Some(5));
        assert!((track.target_duration() - 89.5).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_middle_blocks_are_skipped() {
        let content = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\nworld\n\n2\n00:00:03,000 --> 00:00:0x,000\nbad\n\n3\n00:00:05,000 --> 00:00:11,000\nend\n";
        let track = SubtitleTrack::parse(content).unwrap();

        assert_eq!(track.cues.len(), 2);
        assert_eq!(track.cues[0].text, vec!["Hello"]);
        assert_eq!(track.cues[1].index, Some(3));
        assert!((track.target_duration() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unordered_cues_use_file_order() {
        let content = "1\n00:00:02,000 --> 00:00:04,000\nfirst\n\n2\n00:00:00,500 --> 00:00:01,500\nearlier\n\n3\n00:00:06,000 --> 00:00:09,000\nlast\n";
        let track = SubtitleTrack::parse(content).unwrap();

        assert_eq!(track.cues.len(), 3);
        assert_eq!(track.first_start(), Timestamp::new(0, 0, 2, 0));
        assert!((track.target_duration() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable() {
        assert!(matches!(SubtitleTrack::parse(""), Err(RetimeError::UnparseableSubtitle(_))));
        assert!(matches!(SubtitleTrack::parse("\n\n \n"), Err(RetimeError::UnparseableSubtitle(_))));
        assert!(matches!(
            SubtitleTrack::parse("1\nnot a timing line\ntext\n"),
            Err(RetimeError::UnparseableSubtitle(_))
        ));
        assert!(matches!(SubtitleTrack::parse("1\n"), Err(RetimeError::UnparseableSubtitle(_))));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SubtitleTrack::load(dir.path().join("missing.srt")).await;
        assert!(matches!(result, Err(RetimeError::MissingInput(_))));
    }

    #[tokio::test]
    async fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.srt");
        std::fs::write(&path, SAMPLE).unwrap();

        let track = SubtitleTrack::load(&path).await.unwrap();
        assert_eq!(track.cues.len(), 3);
    }
}
