//! # TUI Adapter
//!
//! The ratatui-specific layer: terminal I/O, page rendering, and the
//! cooperative dispatch loop.
//!
//! ## Loop shape
//!
//! One thread owns all UI and turn state. Each iteration draws the top
//! page, polls the keyboard briefly, drains the inbox of result messages
//! posted by spawned tasks, and executes the commands the sections
//! produced. Network calls never run on this thread: `OpenStream` and
//! `ReadDelta` move the client (and stream) into a tokio task, and the
//! task posts the outcome back through the inbox with ownership attached.

pub mod event;
pub mod msg;
pub mod pages;
pub mod sections;

use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Duration;

use log::{debug, info, warn};
use ratatui::layout::{Constraint, Direction};

use crate::core::config::ResolvedConfig;
use crate::llm::registry::ClientRegistry;
use crate::llm::types::ModelEntry;
use crate::tui::event::{poll_event_timeout, TuiEvent};
use crate::tui::msg::{Command, Msg};
use crate::tui::pages::{Page, PageName, PageStack};
use crate::tui::sections::convo::ConvoSection;
use crate::tui::sections::help::HelpSection;
use crate::tui::sections::model_list::ModelListSection;
use crate::tui::sections::prompt::PromptSection;
use crate::tui::sections::SectionName;

/// The root page: prompt input on the left, conversation on the right.
/// Focus starts on the prompt.
pub fn chat_page(registry: ClientRegistry) -> Page {
    let mut page = Page::new(PageName::Chat, Direction::Horizontal);
    page.add_section(
        SectionName::Prompt,
        Box::new(PromptSection::new()),
        Constraint::Percentage(30),
    );
    page.add_section(
        SectionName::Convo,
        Box::new(ConvoSection::new(registry)),
        Constraint::Percentage(70),
    );
    page.rotate_focus();
    page
}

fn model_page(models: Vec<ModelEntry>, current_model: String) -> Page {
    let mut page = Page::new(PageName::ModelSelect, Direction::Vertical);
    page.add_section(
        SectionName::ModelList,
        Box::new(ModelListSection::new(models, current_model)),
        Constraint::Percentage(100),
    );
    page.rotate_focus();
    page
}

fn help_page() -> Page {
    let mut page = Page::new(PageName::Help, Direction::Vertical);
    page.add_section(
        SectionName::Help,
        Box::new(HelpSection::new()),
        Constraint::Percentage(100),
    );
    page.rotate_focus();
    page
}

/// Runs the TUI to completion. Must be called inside a tokio runtime; the
/// loop itself is synchronous, but turn commands spawn tasks on it.
pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let registry = ClientRegistry::new(config);
    let models: Vec<ModelEntry> = registry.models().to_vec();
    let mut current_model = registry.current_model().to_string();

    let mut terminal = ratatui::init();
    let (tx, rx) = mpsc::channel::<Msg>();

    let mut stack = PageStack::new(chat_page(registry));
    let size = terminal.size()?;
    stack.set_dimensions(size.width, size.height);
    info!("TUI started ({}x{})", size.width, size.height);

    'outer: loop {
        terminal.draw(|frame| stack.top_mut().render(frame, frame.area()))?;

        let mut pending: VecDeque<Command> = VecDeque::new();

        // Navigation keys belong to the loop; everything else goes to the
        // current page as a message.
        if let Some(event) = poll_event_timeout(Duration::from_millis(100)) {
            match event {
                TuiEvent::ForceQuit => break 'outer,
                TuiEvent::Resize => {
                    let size = terminal.size()?;
                    stack.set_dimensions(size.width, size.height);
                }
                TuiEvent::FocusNext => stack.top_mut().rotate_focus(),
                TuiEvent::Help if stack.top_mut().get_page_name() == PageName::Chat => {
                    pending.push_back(Command::OpenPage(PageName::Help));
                }
                TuiEvent::Models if stack.top_mut().get_page_name() == PageName::Chat => {
                    pending.push_back(Command::OpenPage(PageName::ModelSelect));
                }
                TuiEvent::Back if stack.len() > 1 => {
                    pending.push_back(Command::ClosePage);
                }
                other => {
                    let mut msg = Some(Msg::Key(other));
                    pending.extend(stack.top_mut().update(&mut msg));
                }
            }
        }

        // Result messages go to every page: a turn keeps streaming into
        // the chat page even while an overlay is on top.
        while let Ok(received) = rx.try_recv() {
            debug!("inbox: {:?}", received);
            let mut msg = Some(received);
            pending.extend(stack.update_all(&mut msg));
        }

        while let Some(command) = pending.pop_front() {
            debug!("command: {:?}", command);
            match command {
                Command::OpenStream { mut client, prompt } => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let outcome = match client.prompt(&prompt).await {
                            Ok(stream) => Msg::StreamOpened { client, stream },
                            Err(error) => Msg::TurnFailed { client, error },
                        };
                        if tx.send(outcome).is_err() {
                            warn!("stream-open result dropped: receiver gone");
                        }
                    });
                }
                Command::ReadDelta { mut client, stream } => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let outcome = match client.get_delta(stream).await {
                            Ok((response, stream)) => Msg::StreamDelta {
                                client,
                                stream,
                                response,
                            },
                            Err(error) => Msg::TurnFailed { client, error },
                        };
                        if tx.send(outcome).is_err() {
                            warn!("delta result dropped: receiver gone");
                        }
                    });
                }
                Command::CloseStream(mut stream) => stream.close(),
                Command::Broadcast(message) => {
                    // The picker's pick is only a request; the registry
                    // confirms the ones it applied.
                    if let Msg::ModelSwitched(name) = &message {
                        current_model = name.clone();
                    }
                    let mut msg = Some(message);
                    pending.extend(stack.update_all(&mut msg));
                }
                Command::OpenPage(name) => {
                    let page = match name {
                        PageName::ModelSelect => {
                            model_page(models.clone(), current_model.clone())
                        }
                        PageName::Help => help_page(),
                        // The chat page is the root; it is never re-opened.
                        PageName::Chat => continue,
                    };
                    stack.push(page);
                    let size = terminal.size()?;
                    stack.set_dimensions(size.width, size.height);
                }
                Command::ClosePage => {
                    stack.pop();
                }
                Command::Quit => break 'outer,
            }
        }
    }

    ratatui::restore();
    info!("TUI stopped");
    Ok(())
}
