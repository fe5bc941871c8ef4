//! Batch mode selection state.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    #[default]
    Inactive,
    Active,
}

#[derive(Debug, Clone, Default)]
pub struct BatchSelection {
    mode: BatchMode,
    selected: BTreeSet<String>,
}

impl BatchSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.mode == BatchMode::Active
    }

    pub fn enter(&mut self) {
        self.mode = BatchMode::Active;
    }

    /// Leaves batch mode and drops the selection.
    pub fn exit(&mut self) {
        self.mode = BatchMode::Inactive;
        self.selected.clear();
    }

    /// Returns the mode after toggling.
    pub fn toggle_mode(&mut self) -> BatchMode {
        match self.mode {
            BatchMode::Inactive => self.enter(),
            BatchMode::Active => self.exit(),
        }
        self.mode
    }

    /// Adds or removes `id`. Ignored outside batch mode; returns whether `id` is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if !self.is_active() {
            return false;
        }
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
            return true;
        }
        false
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_ignored_while_inactive() {
        let mut batch = BatchSelection::new();
        assert!(!batch.toggle("b1"));
        assert!(batch.is_empty());
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut batch = BatchSelection::new();
        batch.enter();
        assert!(batch.toggle("b1"));
        assert!(batch.toggle("b2"));
        assert!(!batch.toggle("b1"));
        assert_eq!(batch.selected().iter().collect::<Vec<_>>(), vec!["b2"]);
    }

    #[test]
    fn test_exit_clears_selection() {
        let mut batch = BatchSelection::new();
        assert_eq!(batch.toggle_mode(), BatchMode::Active);
        batch.toggle("b1");
        assert_eq!(batch.toggle_mode(), BatchMode::Inactive);
        assert!(batch.is_empty());

        batch.enter();
        assert!(batch.is_empty());
    }
}
