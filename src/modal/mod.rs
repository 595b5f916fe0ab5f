//! Single-instance customization window.
//!
//! `ModalController::open` suspends until the operator confirms or cancels.
//! The live form is a `ModalSession` handed to a `Surface`, which drives it
//! from whatever front-end is attached (terminal, tests).

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::errors::PosError;
use crate::page::SharedPage;
use crate::pricing::chosen_option;
use crate::view::{render, Control, FieldView, FormView};
use crate::wire::{ChosenOption, Prompt};

type Resolution = Option<Vec<ChosenOption>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Open,
}

/// Presents an open session. `show` must not block; the surface keeps the
/// session and resolves it later.
pub trait Surface: Send + Sync {
    fn show(&self, session: ModalSession);
}

#[derive(Clone)]
pub struct ModalController {
    state: Arc<Mutex<ModalState>>,
    page: SharedPage,
    surface: Arc<dyn Surface>,
}

impl ModalController {
    pub fn new(page: SharedPage, surface: Arc<dyn Surface>) -> Self {
        Self { state: Arc::new(Mutex::new(ModalState::Closed)), page, surface }
    }

    pub fn is_open(&self) -> bool {
        *self.state.lock() == ModalState::Open
    }

    /// Show `prompts` and wait for the answers. `None` means cancelled, or
    /// another window was already open (nothing is shown in that case).
    pub async fn open(&self, title: &str, prompts: Vec<Prompt>) -> Option<Vec<ChosenOption>> {
        {
            let mut state = self.state.lock();
            if *state == ModalState::Open {
                tracing::debug!(title, "modal already open; refusing a second one");
                return None;
            }
            *state = ModalState::Open;
        }
        self.page.lock().lock_interaction();

        let (tx, rx) = oneshot::channel();
        let session = ModalSession {
            view: render(title, &prompts),
            prompts,
            notice: None,
            resolver: Some(tx),
            guard: Some(OpenGuard { state: self.state.clone(), page: self.page.clone() }),
        };
        tracing::debug!(title, fields = session.view.fields.len(), "modal opened");
        self.surface.show(session);

        rx.await.unwrap_or(None)
    }
}

/// Releases the page lock and marks the controller closed when dropped.
struct OpenGuard {
    state: Arc<Mutex<ModalState>>,
    page: SharedPage,
}

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.page.lock().release_interaction();
        *self.state.lock() = ModalState::Closed;
        tracing::debug!("modal closed");
    }
}

pub struct ModalSession {
    prompts: Vec<Prompt>,
    view: FormView,
    notice: Option<String>,
    resolver: Option<oneshot::Sender<Resolution>>,
    guard: Option<OpenGuard>,
}

impl ModalSession {
    pub fn view(&self) -> &FormView {
        &self.view
    }

    pub fn is_open(&self) -> bool {
        self.guard.is_some()
    }

    /// Message from the last rejected confirm, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_checked(&mut self, field: usize, on: bool) -> Result<(), PosError> {
        match self.control_mut(field)? {
            (_, Control::Boolean { checked }) => {
                *checked = on;
                Ok(())
            }
            (name, _) => Err(PosError::KindMismatch(name.to_string())),
        }
    }

    pub fn select(&mut self, field: usize, choice: usize) -> Result<(), PosError> {
        match self.control_mut(field)? {
            (name, Control::Single { choices, selected }) => {
                if choice >= choices.len() {
                    return Err(PosError::UnknownChoice(name.to_string(), choice.to_string()));
                }
                *selected = Some(choice);
                Ok(())
            }
            (name, _) => Err(PosError::KindMismatch(name.to_string())),
        }
    }

    pub fn set_choice(&mut self, field: usize, choice: usize, on: bool) -> Result<(), PosError> {
        match self.control_mut(field)? {
            (name, Control::Multi { choices }) => {
                let item = choices
                    .get_mut(choice)
                    .ok_or_else(|| PosError::UnknownChoice(name.to_string(), choice.to_string()))?;
                item.checked = on;
                Ok(())
            }
            (name, _) => Err(PosError::KindMismatch(name.to_string())),
        }
    }

    /// Validate and resolve with one option per prompt. On a missing required
    /// answer the session stays open and `notice` names the prompt.
    pub fn confirm(&mut self) -> Result<Vec<ChosenOption>, PosError> {
        if !self.is_open() {
            return Err(PosError::ModalClosed);
        }
        if let Some(missing) = self.view.fields.iter().find(|f| !f.control.satisfies(f.required)) {
            let err = PosError::MissingAnswer(missing.name.clone());
            self.notice = Some(err.to_string());
            return Err(err);
        }
        let chosen: Vec<ChosenOption> = self
            .prompts
            .iter()
            .zip(&self.view.fields)
            .map(|(p, f)| chosen_option(p, &f.control.answer()))
            .collect();
        self.notice = None;
        self.finish(Some(chosen.clone()));
        Ok(chosen)
    }

    /// Cancel button or close affordance.
    pub fn cancel(&mut self) {
        self.finish(None);
    }

    /// Click on the overlay background.
    pub fn dismiss(&mut self) {
        self.finish(None);
    }

    fn control_mut(&mut self, field: usize) -> Result<(&str, &mut Control), PosError> {
        if !self.is_open() {
            return Err(PosError::ModalClosed);
        }
        let FieldView { name, control, .. } =
            self.view.fields.get_mut(field).ok_or(PosError::NoSuchPrompt(field))?;
        Ok((name.as_str(), control))
    }

    // Tear down before waking the opener so it never observes an open window.
    fn finish(&mut self, result: Resolution) {
        drop(self.guard.take());
        if let Some(tx) = self.resolver.take() {
            let _ = tx.send(result);
        }
    }
}

impl Drop for ModalSession {
    fn drop(&mut self) {
        if self.is_open() {
            tracing::debug!(title = %self.view.title, "modal session dropped unresolved");
            self.finish(None);
        }
    }
}
