// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::OsString;
use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use super::{CaptureError, RegionGrabber};

/// Placeholder replaced by the output path when rendering a template
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// A program plus positional arguments, one of which names the output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

impl CommandTemplate {
    /// # Errors
    /// Returns `CaptureError::InvalidTemplate` if no argument contains `{output}`
    pub fn new(program: impl Into<String>, args: &[&str]) -> Result<Self, CaptureError> {
        let program = program.into();
        if !args.iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER)) {
            return Err(CaptureError::InvalidTemplate(program));
        }
        Ok(Self {
            program,
            args: args.iter().map(ToString::to_string).collect(),
        })
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with every `{output}` replaced by `output`
    #[must_use]
    pub fn render(&self, output: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| {
                if arg == OUTPUT_PLACEHOLDER {
                    output.as_os_str().to_owned()
                } else {
                    OsString::from(arg.replace(OUTPUT_PLACEHOLDER, &output.to_string_lossy()))
                }
            })
            .collect()
    }
}

/// Region selection through an interactive command line tool.
#[derive(Debug, Clone)]
pub struct ExternalGrabber {
    name: &'static str,
    template: CommandTemplate,
}

impl ExternalGrabber {
    #[must_use]
    pub fn new(name: &'static str, template: CommandTemplate) -> Self {
        Self { name, template }
    }

    #[must_use]
    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }
}

#[async_trait]
impl RegionGrabber for ExternalGrabber {
    async fn is_available(&self) -> bool {
        program_on_path(self.template.program())
    }

    async fn grab(&self, target: &Path) -> Result<(), CaptureError> {
        run_tool(self.template.program(), self.template.render(target)).await
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Known region grabbers in order of preference
#[must_use]
pub fn builtin_grabbers() -> Vec<ExternalGrabber> {
    let known: [(&'static str, &str, &[&str]); 4] = [
        ("gm", "gm", &["import", OUTPUT_PLACEHOLDER]),
        ("import", "import", &[OUTPUT_PLACEHOLDER]),
        ("maim", "maim", &["-s", OUTPUT_PLACEHOLDER]),
        ("scrot", "scrot", &["-s", "-o", OUTPUT_PLACEHOLDER]),
    ];

    known
        .into_iter()
        .filter_map(|(name, program, args)| {
            CommandTemplate::new(program, args)
                .ok()
                .map(|template| ExternalGrabber::new(name, template))
        })
        .collect()
}

/// Check whether `program` resolves to a file, either as a path or on `PATH`
#[must_use]
pub fn program_on_path(program: &str) -> bool {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file();
    }
    std::env::var_os("PATH").is_some_and(|paths| {
        std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
    })
}

/// Run a tool to completion and check its exit status.
///
/// Blocks the calling task until the tool exits; interactive tools return
/// once the user has finished the selection.
///
/// # Errors
/// Returns `CaptureError::Spawn` if the tool cannot be started and
/// `CaptureError::ToolFailed` on a non-zero exit
pub async fn run_tool<I>(program: &str, args: I) -> Result<(), CaptureError>
where
    I: IntoIterator<Item = OsString>,
{
    let args: Vec<OsString> = args.into_iter().collect();
    log::debug!("running {program} {args:?}");

    let status = Command::new(program)
        .args(&args)
        .status()
        .await
        .map_err(|source| CaptureError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(CaptureError::ToolFailed {
            program: program.to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn template_requires_output_placeholder() {
        let err = CommandTemplate::new("maim", &["-s"]).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidTemplate(ref p) if p == "maim"));
    }

    #[test]
    fn render_substitutes_output_path() {
        let template = CommandTemplate::new("tool", &["-o", "{output}", "--name={output}"]).unwrap();
        let args = template.render(&PathBuf::from("/tmp/x.png"));
        assert_eq!(
            args,
            vec![
                OsString::from("-o"),
                OsString::from("/tmp/x.png"),
                OsString::from("--name=/tmp/x.png"),
            ]
        );
    }

    #[test]
    fn builtin_grabbers_prefer_graphicsmagick() {
        let names: Vec<_> = builtin_grabbers().iter().map(|g| g.name().to_string()).collect();
        assert_eq!(names, ["gm", "import", "maim", "scrot"]);
        assert_eq!(builtin_grabbers()[0].template().program(), "gm");
    }

    #[test]
    fn finds_programs_on_path() {
        assert!(program_on_path("sh"));
        assert!(!program_on_path("batchshot-definitely-missing-tool"));
        assert!(!program_on_path("/nonexistent/dir/tool"));
    }

    #[tokio::test]
    async fn grabber_runs_template_against_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.png");
        std::fs::write(&source, b"png bytes").unwrap();
        let source_arg = source.to_string_lossy().to_string();
        let grabber = ExternalGrabber::new(
            "copy",
            CommandTemplate::new("cp", &[source_arg.as_str(), OUTPUT_PLACEHOLDER]).unwrap(),
        );
        let target = dir.path().join("00000.png");

        assert!(grabber.is_available().await);
        grabber.grab(&target).await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"png bytes");
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported() {
        let err = run_tool("false", Vec::new()).await.unwrap_err();
        assert!(matches!(err, CaptureError::ToolFailed { ref program, .. } if program == "false"));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = run_tool("batchshot-definitely-missing-tool", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Spawn { .. }));
    }
}
