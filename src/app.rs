// SPDX-License-Identifier: GPL-3.0-only

use crate::settings::BatchConfig;
use crate::ui::{BatchMessage, BatchWidget, Prompt};
use cosmic::app::ApplicationExt;
use cosmic::iced::{event, window};
use cosmic::{app, Element};

// GUI Application Implementation
pub struct BatchshotApp {
    core: app::Core,
    widget: BatchWidget,
}

impl BatchshotApp {
    fn close_prompt(&mut self) -> cosmic::Task<cosmic::Action<BatchMessage>> {
        self.widget.prompt = None;
        match self.widget.prompt_window_id.take() {
            Some(window_id) => window::close(window_id).map(cosmic::Action::App),
            None => cosmic::Task::none(),
        }
    }

    fn follow_up(message: Option<Box<BatchMessage>>) -> cosmic::Task<cosmic::Action<BatchMessage>> {
        match message {
            Some(message) => cosmic::Task::done(cosmic::Action::App(*message)),
            None => cosmic::Task::none(),
        }
    }
}

impl app::Application for BatchshotApp {
    type Executor = cosmic::executor::Default;
    type Flags = BatchConfig;
    type Message = BatchMessage;

    const APP_ID: &'static str = crate::settings::APP_ID;

    fn core(&self) -> &app::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut app::Core {
        &mut self.core
    }

    fn init(
        core: app::Core,
        flags: Self::Flags,
    ) -> (Self, cosmic::Task<cosmic::Action<Self::Message>>) {
        let mut widget = BatchWidget::new(flags);
        widget.main_window_id = core.main_window_id();
        let task = widget.init().map(cosmic::Action::App);

        let app = Self { core, widget };
        let title = match app.core.main_window_id() {
            Some(window_id) => app.set_window_title("Batch Screenshots".to_string(), window_id),
            None => cosmic::Task::none(),
        };

        (app, cosmic::Task::batch([task, title]))
    }

    fn header_start(&self) -> Vec<Element<'_, Self::Message>> {
        vec![]
    }

    fn header_center(&self) -> Vec<Element<'_, Self::Message>> {
        vec![]
    }

    fn header_end(&self) -> Vec<Element<'_, Self::Message>> {
        vec![]
    }

    fn view(&self) -> Element<'_, Self::Message> {
        self.widget.view()
    }

    fn view_window(&self, window_id: window::Id) -> Element<'_, Self::Message> {
        if Some(window_id) == self.widget.prompt_window_id {
            return self.widget.view_prompt();
        }

        self.view()
    }

    fn update(&mut self, message: Self::Message) -> cosmic::Task<cosmic::Action<Self::Message>> {
        match message {
            BatchMessage::OpenPrompt(prompt) => {
                let title = prompt.title.clone();
                self.widget.prompt = Some(prompt);

                // Reuse an open prompt window
                if let Some(window_id) = self.widget.prompt_window_id {
                    return self.set_window_title(title, window_id);
                }

                let window_settings = window::Settings {
                    size: cosmic::iced::Size::new(400.0, 200.0),
                    position: window::Position::Centered,
                    resizable: false,
                    decorations: true,
                    ..Default::default()
                };

                return window::open(window_settings)
                    .1
                    .map(BatchMessage::PromptOpened)
                    .map(cosmic::Action::App);
            }
            BatchMessage::PromptOpened(window_id) => {
                self.widget.prompt_window_id = Some(window_id);
                let title = self
                    .widget
                    .prompt
                    .as_ref()
                    .map_or_else(String::new, |prompt| prompt.title.clone());
                return self.set_window_title(title, window_id);
            }
            BatchMessage::AcceptPrompt => {
                let follow_up = self.widget.prompt.as_mut().and_then(|p| p.on_accept.take());
                return cosmic::Task::batch([self.close_prompt(), Self::follow_up(follow_up)]);
            }
            BatchMessage::DismissPrompt => {
                return self.close_prompt();
            }
            BatchMessage::PromptClosed(window_id) => {
                if Some(window_id) == self.widget.prompt_window_id {
                    self.widget.prompt_window_id = None;
                    let follow_up = self.widget.prompt.take().and_then(Prompt::on_close);
                    return Self::follow_up(follow_up);
                }
            }
            BatchMessage::WindowCloseRequested(window_id) | BatchMessage::WindowClosed(window_id) => {
                if Some(window_id) == self.widget.prompt_window_id {
                    return cosmic::Task::done(cosmic::Action::App(BatchMessage::PromptClosed(window_id)));
                } else if Some(window_id) == self.core.main_window_id() {
                    self.widget.shutdown();
                }
            }
            BatchMessage::Exit => {
                self.widget.shutdown();
                let mut tasks = vec![self.close_prompt()];
                if let Some(main_window) = self.core.main_window_id() {
                    tasks.push(window::close(main_window).map(cosmic::Action::App));
                }
                return cosmic::Task::batch(tasks);
            }
            _ => {}
        }

        self.widget.update(message).map(cosmic::Action::App)
    }

    fn subscription(&self) -> cosmic::iced::Subscription<Self::Message> {
        event::listen_with(|event, _, window_id| {
            if let cosmic::iced::Event::Window(window_event) = event {
                match window_event {
                    cosmic::iced::window::Event::CloseRequested => {
                        Some(BatchMessage::WindowCloseRequested(window_id))
                    }
                    cosmic::iced::window::Event::Closed => Some(BatchMessage::WindowClosed(window_id)),
                    _ => None,
                }
            } else {
                None
            }
        })
    }
}

/// Launch the GUI with the resolved configuration.
///
/// # Errors
/// Returns the iced error if the event loop cannot start
pub fn run(config: BatchConfig) -> cosmic::iced::Result {
    crate::error_handling::set_gui_mode(true);

    #[allow(clippy::cast_precision_loss)]
    let size = cosmic::iced::Size::new(
        config.preview_size.0 as f32 + 80.0,
        config.preview_size.1 as f32 + 220.0,
    );
    let settings = cosmic::app::Settings::default().size(size);
    cosmic::app::run::<BatchshotApp>(settings, config)
}
