use crate::utils::error::{LogoError, Result};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Target area inside the background where a logo or text is centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    pub start_x: u32,
    pub start_y: u32,
    pub end_x: u32,
    pub end_y: u32,
}

impl Rectangle {
    pub fn new(start_x: u32, start_y: u32, end_x: u32, end_y: u32) -> Result<Self> {
        if end_x < start_x || end_y < start_y {
            return Err(LogoError::input(format!(
                "EndX({}) should be > StartX({}) and EndY({}) should be > StartY({})",
                end_x, start_x, end_y, start_y
            )));
        }
        let rect = Self {
            start_x,
            start_y,
            end_x,
            end_y,
        };
        if rect.width() == 0 || rect.height() == 0 {
            return Err(LogoError::InvalidDimension {
                what: "logo area".to_string(),
                width: rect.width(),
                height: rect.height(),
            });
        }
        Ok(rect)
    }

    /// 由設定檔中的 `XxY` 字串建立矩形
    pub fn from_corners(start: &str, end: &str) -> Result<Self> {
        let (start_x, start_y) = parse_point("logo_start", start)?;
        let (end_x, end_y) = parse_point("logo_end", end)?;
        Self::new(start_x, start_y, end_x, end_y)
    }

    pub fn width(&self) -> u32 {
        self.end_x - self.start_x
    }

    pub fn height(&self) -> u32 {
        self.end_y - self.start_y
    }

    pub fn center_x(&self) -> i64 {
        (self.start_x + self.width() / 2) as i64
    }

    pub fn center_y(&self) -> i64 {
        (self.start_y + self.height() / 2) as i64
    }

    /// The rectangle must lie inside a canvas of the given size.
    pub fn ensure_within(&self, canvas_width: u32, canvas_height: u32) -> Result<()> {
        if self.start_x > canvas_width
            || self.end_x > canvas_width
            || self.start_y > canvas_height
            || self.end_y > canvas_height
        {
            return Err(LogoError::input(format!(
                "Start/End coordinates of logo must be within the base image. \
                 Image resolution = {}x{}, logo start {}x{}, logo end {}x{}",
                canvas_width,
                canvas_height,
                self.start_x,
                self.start_y,
                self.end_x,
                self.end_y
            )));
        }
        Ok(())
    }
}

fn parse_point(field: &str, value: &str) -> Result<(u32, u32)> {
    let invalid = |reason: &str| LogoError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (x, y) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| invalid("expected a coordinate written as XxY, e.g. 1200x100"))?;
    let x = x
        .trim()
        .parse::<u32>()
        .map_err(|_| invalid("X is not a positive integer"))?;
    let y = y
        .trim()
        .parse::<u32>()
        .map_err(|_| invalid("Y is not a positive integer"))?;
    Ok((x, y))
}

/// Final overlay size and its top-left position on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub width: u32,
    pub height: u32,
    pub offset_x: i64,
    pub offset_y: i64,
    pub scaled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPlacement {
    pub lines: Vec<String>,
    pub font_size: u32,
    pub width: u32,
    pub height: u32,
    pub offset_x: i64,
    pub offset_y: i64,
}

/// Virtual background slots on the video device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundSlot {
    User1,
    User2,
    User3,
}

impl FromStr for BackgroundSlot {
    type Err = LogoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "user1" => Ok(Self::User1),
            "user2" => Ok(Self::User2),
            "user3" => Ok(Self::User3),
            _ => Err(LogoError::InvalidConfigValueError {
                field: "background_slot".to_string(),
                value: s.to_string(),
                reason: "Allowed values: User1, User2 or User3".to_string(),
            }),
        }
    }
}

impl fmt::Display for BackgroundSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User1 => "User1",
            Self::User2 => "User2",
            Self::User3 => "User3",
        };
        f.write_str(name)
    }
}

/// Where the overlay (or replacement background) comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoSource {
    Email(String),
    Url(Url),
    LocalFile(String),
    Text(String),
    BareDomain(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read the participant list and pick the most common external domain.
    AutoDetect,
    Help,
    Clear,
    Switch(BackgroundSlot),
    ReplaceBackground(BackgroundSlot, LogoSource),
    Embed(LogoSource),
}
