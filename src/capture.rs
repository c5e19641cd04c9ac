use crate::note::{ComposeForm, Note};

/// Selection bounding rectangle in viewport coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

/// Document coordinates of the floating button.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FabPosition {
    pub top: f64,
    pub left: f64,
}

/// Places the button just below the start of the selection.
pub fn fab_position(rect: Rect, scroll_x: f64, scroll_y: f64, offset: f64) -> FabPosition {
    FabPosition {
        top: scroll_y + rect.bottom + offset,
        left: scroll_x + rect.left,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CaptureState {
    Idle,
    Armed(FabPosition),
    Composing(ComposeForm),
}

pub struct CaptureMachine {
    state: CaptureState,
    offset: f64,
    title_max_chars: usize,
}

impl CaptureMachine {
    pub fn new(offset: f64, title_max_chars: usize) -> Self {
        Self {
            state: CaptureState::Idle,
            offset,
            title_max_chars,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_composing(&self) -> bool {
        matches!(self.state, CaptureState::Composing(_))
    }

    /// Reacts to `selectionchange`. Ignored while the composer is open.
    pub fn on_selection_change(
        &mut self,
        text: &str,
        rect: Option<Rect>,
        scroll: (f64, f64),
    ) -> &CaptureState {
        if self.is_composing() {
            return &self.state;
        }
        self.state = match rect {
            Some(rect) if !text.trim().is_empty() => {
                CaptureState::Armed(fab_position(rect, scroll.0, scroll.1, self.offset))
            }
            _ => CaptureState::Idle,
        };
        &self.state
    }

    /// Button click or shortcut. `None` when there is no selection or the
    /// composer is already open.
    pub fn open_composer(&mut self, selection: &str) -> Option<&ComposeForm> {
        if self.is_composing() || selection.trim().is_empty() {
            return None;
        }
        self.state = CaptureState::Composing(ComposeForm::prefilled(
            selection,
            self.title_max_chars,
        ));
        match &self.state {
            CaptureState::Composing(form) => Some(form),
            _ => None,
        }
    }

    /// Builds the note for a save. The composer stays open until
    /// [`finish`](Self::finish) so a failed write keeps the input.
    pub fn commit(&self, form: ComposeForm, default_title: &str) -> Option<Note> {
        self.is_composing()
            .then(|| form.into_note(default_title))
    }

    pub fn cancel(&mut self) {
        self.state = CaptureState::Idle;
    }

    pub fn finish(&mut self) {
        self.state = CaptureState::Idle;
    }
}
