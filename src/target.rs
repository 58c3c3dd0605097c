//! The logger's output targets.

use std::fmt::Debug;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use termcolor::{BufferedStandardStream, ColorChoice, NoColor, WriteColor};

/// Similar to [`crate::builder::OutputTarget`], but contains the actual writer for the
/// destination.
pub enum OutputTargetImpl {
    /// Writes to STDOUT. May use colors depending on the environment.
    Stdout(BufferedStandardStream),
    /// Writes to STDERR. May use colors depending on the environment.
    Stderr(BufferedStandardStream),
    /// Appends to a file. Never uses colors.
    File(NoColor<BufWriter<File>>),
}

impl Debug for OutputTargetImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputTargetImpl::Stdout(stdout) => f
                .debug_tuple("Stdout")
                .field(if stdout.supports_color() {
                    &"<stdout stream with color support>"
                } else {
                    &"<stdout stream>"
                })
                .finish(),
            OutputTargetImpl::Stderr(stderr) => f
                .debug_tuple("Stderr")
                .field(if stderr.supports_color() {
                    &"<stderr stream with color support>"
                } else {
                    &"<stderr stream>"
                })
                .finish(),
            OutputTargetImpl::File(file) => f.debug_tuple("File").field(file.get_ref()).finish(),
        }
    }
}

impl OutputTargetImpl {
    /// Construct an [`OutputTargetImpl`] that writes to STDOUT with optional color support
    /// determined by the environment.
    pub fn new_stdout() -> Self {
        OutputTargetImpl::Stdout(BufferedStandardStream::stdout(color_support(
            atty::Stream::Stdout,
        )))
    }

    /// Construct an [`OutputTargetImpl`] that writes to STDERR with optional color support
    /// determined by the environment.
    pub fn new_stderr() -> Self {
        OutputTargetImpl::Stderr(BufferedStandardStream::stderr(color_support(
            atty::Stream::Stderr,
        )))
    }

    /// Construct an [`OutputTargetImpl`] for doing buffered writes to a file. The file is created
    /// if it doesn't exist yet, and appended to otherwise.
    pub fn new_file_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let file = File::options().create(true).append(true).open(path)?;

        Ok(Self::File(NoColor::new(BufWriter::with_capacity(8192, file))))
    }

    /// The writer for this target. Colors are silently ignored for targets that don't support
    /// them.
    pub fn writer(&mut self) -> &mut dyn WriteColor {
        match self {
            OutputTargetImpl::Stdout(ref mut stdout) => stdout,
            OutputTargetImpl::Stderr(ref mut stderr) => stderr,
            OutputTargetImpl::File(ref mut file) => file,
        }
    }

    /// Whether every record should be flushed immediately after it's been written. Standard streams
    /// are flushed per record so interleaved output from other sources stays readable. Files are
    /// only flushed on sync.
    pub fn flush_per_record(&self) -> bool {
        match self {
            OutputTargetImpl::Stdout(_) | OutputTargetImpl::Stderr(_) => true,
            OutputTargetImpl::File(_) => false,
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer().flush()
    }
}

/// Whether to use colors when outputting to `stream`. Considers the `CLICOLOR`, `CLICOLOR_FORCE`,
/// and `NO_COLOR` environment variables, and whether or not the stream is attached to a real TTY.
fn color_support(stream: atty::Stream) -> ColorChoice {
    if let Ok(value) = std::env::var("CLICOLOR_FORCE") {
        if value.trim() != "0" {
            return ColorChoice::Always;
        }
    }

    if let Ok(value) = std::env::var("NO_COLOR") {
        if value.trim() != "0" {
            return ColorChoice::Never;
        }
    }

    if let Ok(value) = std::env::var("CLICOLOR") {
        if value.trim() == "0" {
            return ColorChoice::Never;
        }
    }

    // If `CLICOLOR` is unset or set to a truthy value, and colors aren't forced, then terminal
    // support determines whether or not colors are used
    if atty::is(stream) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}
