//! Standard stream redirection targets.

use std::fs::File;
use std::io;
use std::process::Stdio;

/// Where one of a child's standard streams goes.
#[derive(Debug, Default)]
pub enum Redirect {
    /// Share the parent's stream. This is the unset state.
    #[default]
    Inherit,
    /// Route through a pipe so the content can be captured.
    Pipe,
    /// Discard to the null device.
    Null,
    /// An already open file or descriptor.
    File(File),
}

impl Redirect {
    /// Whether this stream is still at its default.
    pub fn is_inherit(&self) -> bool {
        matches!(self, Redirect::Inherit)
    }

    /// Whether this stream is captured through a pipe.
    pub fn is_pipe(&self) -> bool {
        matches!(self, Redirect::Pipe)
    }

    /// Build the `Stdio` for one spawn.
    ///
    /// Files are duplicated so the same target can serve every run.
    pub(crate) fn to_stdio(&self) -> io::Result<Stdio> {
        Ok(match self {
            Redirect::Inherit => Stdio::inherit(),
            Redirect::Pipe => Stdio::piped(),
            Redirect::Null => Stdio::null(),
            Redirect::File(file) => Stdio::from(file.try_clone()?),
        })
    }
}

impl From<File> for Redirect {
    fn from(file: File) -> Self {
        Redirect::File(file)
    }
}

#[cfg(unix)]
impl From<std::os::fd::OwnedFd> for Redirect {
    fn from(fd: std::os::fd::OwnedFd) -> Self {
        Redirect::File(File::from(fd))
    }
}
