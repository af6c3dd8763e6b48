//! The output area: the single region that shows a rendered answer, an
//! error, or a loading indicator.
//!
//! Every submission takes a [`Ticket`] from [`OutputArea::begin`]. Only the
//! newest ticket may settle the area, so a slow response that resolves after
//! a newer submission is dropped instead of overwriting it.

use tokio::sync::watch;

/// Shown while a request is in flight.
pub const LOADING_INDICATOR: &str = "<div class=\"loading-spinner\"></div>";

/// What the output area currently displays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Idle,
    Pending,
    Rendered {
        html: String,
    },
    Errored {
        message: String,
    },
}

impl View {
    /// The area's content as displayed.
    pub fn text(&self) -> String {
        match self {
            View::Idle => String::new(),
            View::Pending => LOADING_INDICATOR.to_string(),
            View::Rendered { html } => html.clone(),
            View::Errored { message } => format!("Error: {}", message),
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, View::Rendered { .. } | View::Errored { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputState {
    pub generation: u64,
    pub view: View,
}

/// Handle for one submission; see [`OutputArea::settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Shared output area. Observers bind to it through [`OutputArea::subscribe`].
#[derive(Debug)]
pub struct OutputArea {
    state: watch::Sender<OutputState>,
}

impl Default for OutputArea {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputArea {
    pub fn new() -> Self {
        let (state, _) = watch::channel(OutputState::default());
        Self { state }
    }

    pub fn subscribe(&self) -> watch::Receiver<OutputState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> OutputState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> View {
        self.state.borrow().view.clone()
    }

    /// Start a submission: show the loading indicator and supersede any
    /// in-flight ticket.
    pub fn begin(&self) -> Ticket {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            s.view = View::Pending;
            generation = s.generation;
        });
        Ticket(generation)
    }

    /// Show `view` if `ticket` is still the newest submission. Returns
    /// whether it was applied.
    pub fn settle(&self, ticket: Ticket, view: View) -> bool {
        let applied = self.state.send_if_modified(|s| {
            if s.generation != ticket.0 {
                return false;
            }
            s.view = view;
            true
        });
        if !applied {
            tracing::info!(
                ticket = ticket.0,
                current = self.state.borrow().generation,
                "discarding stale response"
            );
        }
        applied
    }

    /// Clear the area. In-flight tickets are superseded.
    pub fn reset(&self) {
        self.state.send_modify(|s| {
            s.generation += 1;
            s.view = View::Idle;
        });
    }
}
