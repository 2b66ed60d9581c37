// SPDX-License-Identifier: GPL-3.0-only

use crate::capture::CapturePipeline;
use crate::error_handling::{report_error, report_success, should_show_dialog, ErrorSeverity};
use crate::preview::compose_preview;
use crate::session::{Session, UndoOutcome};
use crate::settings::BatchConfig;
use cosmic::dialog::file_chooser;
use cosmic::iced::window;
use cosmic::widget;
use std::path::PathBuf;
use std::time::Duration;

pub const UNDO_EMPTY_MESSAGE: &str = "Cannot undo because you have not made any selections yet.";
pub const CANCEL_CONFIRM_MESSAGE: &str = "Are you sure? No screenshots will be saved.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Single OK button
    Info,
    /// Yes / No
    Confirm,
}

/// Content of the prompt window.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub title: String,
    pub message: String,
    pub kind: PromptKind,
    /// Sent when the prompt is accepted (OK or Yes). Info prompts also send it
    /// when their window is closed.
    pub on_accept: Option<Box<BatchMessage>>,
}

impl Prompt {
    #[must_use]
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: PromptKind::Info,
            on_accept: None,
        }
    }

    #[must_use]
    pub fn confirm(title: impl Into<String>, message: impl Into<String>, on_yes: BatchMessage) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: PromptKind::Confirm,
            on_accept: Some(Box::new(on_yes)),
        }
    }

    #[must_use]
    pub fn then(mut self, message: BatchMessage) -> Self {
        self.on_accept = Some(Box::new(message));
        self
    }

    /// Message to send when the window is closed without a button press.
    ///
    /// Closing an info prompt counts as OK, closing a question as No.
    #[must_use]
    pub fn on_close(self) -> Option<Box<BatchMessage>> {
        match self.kind {
            PromptKind::Info => self.on_accept,
            PromptKind::Confirm => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum BatchMessage {
    PipelineReady(Result<CapturePipeline, String>),
    // Session actions
    Next,
    CaptureFinished(Result<(), String>),
    Undo,
    Save,
    SaveDirectorySelected(Option<PathBuf>),
    Cancel,
    ConfirmCancel,
    // Prompt window
    OpenPrompt(Prompt),
    PromptOpened(window::Id),
    AcceptPrompt,
    DismissPrompt,
    PromptClosed(window::Id),
    // Generic window events
    WindowCloseRequested(window::Id),
    WindowClosed(window::Id),
    // Application exit
    Exit,
    Noop,
}

pub struct BatchWidget {
    pub config: BatchConfig,
    pub session: Option<Session>,
    pub pipeline: Option<CapturePipeline>,
    pub main_window_id: Option<window::Id>,
    pub preview_handle: cosmic::iced::widget::image::Handle,
    // Prompt window state
    pub prompt: Option<Prompt>,
    pub prompt_window_id: Option<window::Id>,
}

impl BatchWidget {
    /// Creates the widget and its session.
    ///
    /// If the temporary directory cannot be created the widget starts without
    /// a session; [`BatchWidget::init`] then reports the problem.
    #[must_use]
    pub fn new(config: BatchConfig) -> Self {
        let session = Session::new()
            .map_err(|e| report_error(ErrorSeverity::Error, "Session Error", &e.to_string()))
            .ok();

        let mut widget = Self {
            preview_handle: blank_handle(config.preview_size),
            config,
            session,
            pipeline: None,
            main_window_id: None,
            prompt: None,
            prompt_window_id: None,
        };
        widget.refresh_image();
        widget
    }

    pub fn init(&self) -> cosmic::Task<BatchMessage> {
        if self.session.is_none() {
            return cosmic::Task::done(BatchMessage::OpenPrompt(
                Prompt::info("Session Error", "Could not create a temporary directory for the captures.")
                    .then(BatchMessage::Exit),
            ));
        }

        let grabber = self.config.grabber.clone();
        let normalizer = self.config.normalizer;
        cosmic::Task::perform(
            async move {
                CapturePipeline::select(&grabber, normalizer)
                    .await
                    .map_err(|e| e.to_string())
            },
            BatchMessage::PipelineReady,
        )
    }

    #[must_use]
    pub fn counter(&self) -> usize {
        self.session.as_ref().map_or(0, Session::counter)
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_capturing)
    }

    /// No session action is accepted while a capture runs or a prompt is up
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.is_capturing() || self.prompt.is_some()
    }

    /// Rebuild the preview from the most recent capture.
    pub fn refresh_image(&mut self) {
        let latest = self.session.as_ref().and_then(Session::latest);
        let size = self.config.preview_size;
        self.preview_handle = match compose_preview(latest.as_deref(), size) {
            Ok(canvas) => {
                let (width, height) = canvas.dimensions();
                cosmic::iced::widget::image::Handle::from_rgba(width, height, canvas.into_raw())
            }
            Err(e) => {
                report_error(ErrorSeverity::Warning, "Preview", &format!("Failed to load capture: {e}"));
                blank_handle(size)
            }
        };
    }

    /// Remove the session's temporary directory.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.cleanup();
        }
    }

    fn restore_main_window(&self) -> cosmic::Task<BatchMessage> {
        let Some(window_id) = self.main_window_id else {
            return cosmic::Task::none();
        };
        cosmic::Task::batch([
            window::minimize(window_id, false).map(|(): ()| BatchMessage::Noop),
            window::gain_focus(window_id).map(|(): ()| BatchMessage::Noop),
        ])
    }

    /// Updates the widget state based on the given message
    #[allow(clippy::too_many_lines)]
    pub fn update(&mut self, message: BatchMessage) -> cosmic::Task<BatchMessage> {
        match message {
            BatchMessage::PipelineReady(Ok(pipeline)) => {
                log::info!(
                    "capture pipeline: {} + {:?}",
                    pipeline.grabber_name(),
                    pipeline.normalizer()
                );
                self.pipeline = Some(pipeline);
                cosmic::Task::none()
            }
            BatchMessage::PipelineReady(Err(err)) => {
                report(
                    ErrorSeverity::Error,
                    "No Capture Tool",
                    &format!("{err}. Install GraphicsMagick, ImageMagick, maim or scrot."),
                )
            }
            BatchMessage::Next => {
                if self.prompt.is_some() {
                    return cosmic::Task::none();
                }
                let (Some(session), Some(pipeline)) = (self.session.as_mut(), self.pipeline.clone()) else {
                    return cosmic::Task::none();
                };
                let target = match session.begin_capture() {
                    Ok(target) => target,
                    Err(e) => {
                        log::debug!("next ignored: {e}");
                        return cosmic::Task::none();
                    }
                };

                let delay = Duration::from_millis(u64::from(self.config.hide_delay_ms));
                let capture = cosmic::Task::perform(
                    async move {
                        tokio::time::sleep(delay).await;
                        pipeline.capture(&target).await.map_err(|e| e.to_string())
                    },
                    BatchMessage::CaptureFinished,
                );

                match self.main_window_id {
                    Some(window_id) => window::minimize(window_id, true)
                        .map(|(): ()| BatchMessage::Noop)
                        .chain(capture),
                    None => capture,
                }
            }
            BatchMessage::CaptureFinished(result) => {
                if let Some(session) = self.session.as_mut() {
                    match result {
                        Ok(()) => match session.finish_capture() {
                            Ok(counter) => log::debug!("capture {counter} stored"),
                            Err(e) => crate::report_warning!("Capture Discarded", &e.to_string()),
                        },
                        Err(err) => {
                            session.abort_capture();
                            crate::report_warning!("Capture Discarded", &err);
                        }
                    }
                }
                self.refresh_image();
                self.restore_main_window()
            }
            BatchMessage::Undo => {
                if self.is_busy() {
                    return cosmic::Task::none();
                }
                let Some(session) = self.session.as_mut() else {
                    return cosmic::Task::none();
                };
                match session.undo() {
                    Ok(UndoOutcome::NothingToUndo) => {
                        report(ErrorSeverity::Info, "Nothing to Undo", UNDO_EMPTY_MESSAGE)
                    }
                    Ok(UndoOutcome::Removed(index)) => {
                        log::debug!("removed capture {index}");
                        self.refresh_image();
                        cosmic::Task::none()
                    }
                    Err(e) => report(ErrorSeverity::Error, e.title(), &e.to_string()),
                }
            }
            BatchMessage::Save => {
                if self.is_busy() {
                    return cosmic::Task::none();
                }
                if let Some(dir) = self.config.save_dir.clone() {
                    return cosmic::Task::done(BatchMessage::SaveDirectorySelected(Some(dir)));
                }
                cosmic::Task::perform(
                    async move {
                        let dialog = file_chooser::open::Dialog::new()
                            .title("Choose Save Directory");

                        match dialog.open_folder().await {
                            Ok(response) => {
                                // Convert URL to PathBuf
                                if let Ok(path) = response.url().to_file_path() {
                                    BatchMessage::SaveDirectorySelected(Some(path))
                                } else {
                                    BatchMessage::SaveDirectorySelected(None)
                                }
                            }
                            Err(file_chooser::Error::Cancelled) => BatchMessage::SaveDirectorySelected(None),
                            Err(err) => {
                                report_error(ErrorSeverity::Warning, "Directory Selection", &format!("Directory selection error: {err}"));
                                BatchMessage::SaveDirectorySelected(None)
                            }
                        }
                    },
                    |msg| msg,
                )
            }
            BatchMessage::SaveDirectorySelected(None) => cosmic::Task::none(),
            BatchMessage::SaveDirectorySelected(Some(root)) => {
                let Some(session) = self.session.as_mut() else {
                    return cosmic::Task::none();
                };
                match session.save(&root) {
                    Ok(destination) => {
                        let shown = destination.display().to_string();
                        report_success("Screenshots Saved", &shown);
                        if self.config.open_after_save {
                            if let Err(e) = open::that_detached(&destination) {
                                report_error(ErrorSeverity::Warning, "Open Folder", &e.to_string());
                            }
                        }
                        cosmic::Task::done(BatchMessage::OpenPrompt(
                            Prompt::info("Screenshots Saved", format!("Saved to: {shown}"))
                                .then(BatchMessage::Exit),
                        ))
                    }
                    Err(e) => {
                        // Let the next Save ask for another folder
                        self.config.save_dir = None;
                        report(ErrorSeverity::Error, e.title(), &e.to_string())
                    }
                }
            }
            BatchMessage::Cancel => {
                if self.is_busy() {
                    return cosmic::Task::none();
                }
                cosmic::Task::done(BatchMessage::OpenPrompt(Prompt::confirm(
                    "Cancel",
                    CANCEL_CONFIRM_MESSAGE,
                    BatchMessage::ConfirmCancel,
                )))
            }
            BatchMessage::ConfirmCancel => {
                if let Some(session) = self.session.as_mut() {
                    session.cancel();
                }
                crate::report_info!("Cancelled", "session ended without saving");
                cosmic::Task::done(BatchMessage::Exit)
            }
            // Window lifecycle and exit are handled by the main app
            BatchMessage::OpenPrompt(_)
            | BatchMessage::PromptOpened(_)
            | BatchMessage::AcceptPrompt
            | BatchMessage::DismissPrompt
            | BatchMessage::PromptClosed(_)
            | BatchMessage::WindowCloseRequested(_)
            | BatchMessage::WindowClosed(_)
            | BatchMessage::Exit
            | BatchMessage::Noop => cosmic::Task::none(),
        }
    }

    pub fn view(&self) -> cosmic::Element<'_, BatchMessage> {
        let spacing = cosmic::theme::active().cosmic().spacing;
        let busy = self.is_busy();

        #[allow(clippy::cast_precision_loss)]
        let (preview_w, preview_h) = (
            self.config.preview_size.0 as f32,
            self.config.preview_size.1 as f32,
        );

        let label = widget::text::title4(format!("Screenshots: {}", self.counter()));

        let preview = widget::container(
            cosmic::widget::image(self.preview_handle.clone())
                .content_fit(cosmic::iced::ContentFit::Contain),
        )
        .width(cosmic::iced::Length::Fixed(preview_w))
        .height(cosmic::iced::Length::Fixed(preview_h))
        .style(|theme: &cosmic::Theme| cosmic::widget::container::Style {
            border: cosmic::iced::Border {
                width: 1.0,
                color: theme.cosmic().bg_divider().into(),
                ..Default::default()
            },
            ..Default::default()
        });

        let can_capture = !busy && self.pipeline.is_some() && self.session.is_some();
        let buttons = widget::row()
            .push(
                widget::button::standard(if self.is_capturing() {
                    "Selecting..."
                } else {
                    "Next selection"
                })
                .on_press_maybe(can_capture.then_some(BatchMessage::Next)),
            )
            .push(widget::button::standard("Undo").on_press_maybe((!busy).then_some(BatchMessage::Undo)))
            .push(
                widget::button::standard("Save and exit")
                    .on_press_maybe((!busy).then_some(BatchMessage::Save)),
            )
            .push(widget::button::standard("Cancel").on_press_maybe((!busy).then_some(BatchMessage::Cancel)))
            .spacing(spacing.space_xs);

        let status = widget::text::caption(match self.pipeline {
            Some(ref pipeline) => format!("Capture tool: {}", pipeline.grabber_name()),
            None => "Looking for a capture tool...".to_string(),
        });

        widget::column()
            .push(label)
            .push(preview)
            .push(buttons)
            .push(status)
            .spacing(spacing.space_s)
            .padding(spacing.space_m)
            .align_x(cosmic::iced::Alignment::Center)
            .into()
    }

    pub fn view_prompt(&self) -> cosmic::Element<'_, BatchMessage> {
        let spacing = cosmic::theme::active().cosmic().spacing;
        let Some(ref prompt) = self.prompt else {
            return widget::container(widget::text("")).into();
        };

        let actions = match prompt.kind {
            PromptKind::Info => widget::row()
                .push(widget::horizontal_space())
                .push(widget::button::standard("OK").on_press(BatchMessage::AcceptPrompt)),
            PromptKind::Confirm => widget::row()
                .push(widget::horizontal_space())
                .push(widget::button::standard("No").on_press(BatchMessage::DismissPrompt))
                .push(widget::button::standard("Yes").on_press(BatchMessage::AcceptPrompt))
                .spacing(spacing.space_xs),
        };

        widget::container(
            widget::column()
                .push(widget::text::title3(prompt.title.clone()))
                .push(widget::vertical_space())
                .push(widget::text(prompt.message.clone()))
                .push(widget::vertical_space())
                .push(actions)
                .spacing(spacing.space_s)
                .max_width(400),
        )
        .padding(spacing.space_m)
        .width(cosmic::iced::Length::Fill)
        .height(cosmic::iced::Length::Fill)
        .into()
    }
}

/// Report and, for dialog-worthy severities, open a prompt
fn report(severity: ErrorSeverity, title: &str, message: &str) -> cosmic::Task<BatchMessage> {
    report_error(severity, title, message);
    if should_show_dialog(severity) {
        cosmic::Task::done(BatchMessage::OpenPrompt(Prompt::info(title, message)))
    } else {
        cosmic::Task::none()
    }
}

fn blank_handle(size: (u32, u32)) -> cosmic::iced::widget::image::Handle {
    let canvas = image::RgbaImage::from_pixel(size.0, size.1, crate::preview::TRANSPARENT);
    cosmic::iced::widget::image::Handle::from_rgba(size.0, size.1, canvas.into_raw())
}
