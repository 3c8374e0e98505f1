use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::DynamicImage;
use walkdir::WalkDir;

use crate::error::{StudioError, StudioResult};

// Facing
//------------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub enum Facing {
    #[default]
    Environment,
    User,
}

impl Facing {
    pub fn toggle(self) -> Self {
        match self {
            Self::Environment => Self::User,
            Self::User => Self::Environment,
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Environment => "environment",
            Self::User => "user",
        })
    }
}

impl FromStr for Facing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "environment" | "back" | "rear" => Ok(Self::Environment),
            "user" | "front" => Ok(Self::User),
            _ => Err(format!("unknown camera facing {s:?}")),
        }
    }
}

// Frame source
//------------------------------------------------------------------------------

/// Something that yields frames for the scanner, such as a camera.
pub trait FrameSource {
    /// Prepares the source for reading. Called on start and again whenever the
    /// facing changes while scanning.
    fn attach(&mut self, facing: Facing) -> StudioResult<()>;

    /// Next frame, or `None` once the source is exhausted. A frame that
    /// cannot be read is an `Err` and does not end the stream.
    fn next_frame(&mut self) -> Option<StudioResult<DynamicImage>>;

    fn detach(&mut self);
}

// Directory source
//------------------------------------------------------------------------------

/// Reads image files under a directory in path order, as if each file were a
/// captured frame. A `front/` or `back/` subdirectory is preferred for the
/// matching facing when present.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    frames: VecDeque<PathBuf>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), frames: VecDeque::new() }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    fn facing_dir(&self, facing: Facing) -> PathBuf {
        let sub = match facing {
            Facing::Environment => "back",
            Facing::User => "front",
        };
        let dir = self.root.join(sub);
        if dir.is_dir() {
            dir
        } else {
            self.root.clone()
        }
    }
}

impl FrameSource for DirectorySource {
    fn attach(&mut self, facing: Facing) -> StudioResult<()> {
        let dir = self.facing_dir(facing);
        self.frames = list_images(&dir)?.into();
        tracing::debug!(dir = %dir.display(), %facing, frames = self.frames.len(), "Attached directory source");
        Ok(())
    }

    fn next_frame(&mut self) -> Option<StudioResult<DynamicImage>> {
        let path = self.frames.pop_front()?;
        tracing::trace!(path = %path.display(), "Reading frame");
        Some(image::open(&path).map_err(StudioError::from))
    }

    fn detach(&mut self) {
        self.frames.clear();
    }
}

pub fn is_image_file(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_file()
        && entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg" | "bmp"))
}

/// Image files under `dir`, sorted by path.
pub fn list_images(dir: &Path) -> StudioResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry =
            entry.map_err(|e| StudioError::Walk { path: dir.to_path_buf(), reason: e.to_string() })?;
        if is_image_file(&entry) {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

// In-memory source
//------------------------------------------------------------------------------

/// Replays a fixed list of frames. Attaching rewinds to the first frame.
#[derive(Debug, Clone, Default)]
pub struct FrameList {
    frames: Vec<DynamicImage>,
    pos: Option<usize>,
    attached_with: Option<Facing>,
}

impl FrameList {
    pub fn new(frames: Vec<DynamicImage>) -> Self {
        Self { frames, pos: None, attached_with: None }
    }

    /// Facing of the most recent attach.
    pub fn attached_with(&self) -> Option<Facing> {
        self.attached_with
    }
}

impl FrameSource for FrameList {
    fn attach(&mut self, facing: Facing) -> StudioResult<()> {
        self.pos = Some(0);
        self.attached_with = Some(facing);
        Ok(())
    }

    fn next_frame(&mut self) -> Option<StudioResult<DynamicImage>> {
        let pos = self.pos.as_mut()?;
        let frame = self.frames.get(*pos)?.clone();
        *pos += 1;
        Some(Ok(frame))
    }

    fn detach(&mut self) {
        self.pos = None;
    }
}
