#![allow(dead_code)]

use core_editor::{Editor, HostNotifier};
use std::cell::RefCell;
use std::rc::Rc;

/// Test notifier capturing every change callback.
#[derive(Clone, Default)]
pub struct Recorder {
    values: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<String> {
        self.values.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn last(&self) -> Option<String> {
        self.values.borrow().last().cloned()
    }
}

impl HostNotifier for Recorder {
    fn value_changed(&mut self, value: &str) {
        self.values.borrow_mut().push(value.to_string());
    }
}

pub fn editor_with_recorder(initial: &str) -> (Editor, Recorder) {
    let recorder = Recorder::new();
    let editor = Editor::new(
        initial,
        core_config::Config::default(),
        Box::new(recorder.clone()),
    );
    (editor, recorder)
}
