//! # Pages and the Page Stack
//!
//! A page is a named set of sections laid out with ratatui constraints.
//! Section order is an explicit vector kept alongside the lookup map, so
//! iteration (dispatch, focus rotation, layout) is deterministic.
//!
//! Pages live on a LIFO stack. The top page is "current": it alone
//! receives key events, while result and broadcast messages reach every
//! page so a turn keeps streaming under an overlay.

use std::collections::HashMap;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

use crate::tui::msg::{Command, Msg};
use crate::tui::sections::{Section, SectionName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageName {
    Chat,
    ModelSelect,
    Help,
}

pub struct Page {
    name: PageName,
    order: Vec<SectionName>,
    sections: HashMap<SectionName, Box<dyn Section>>,
    constraints: Vec<Constraint>,
    direction: Direction,
    is_current: bool,
}

impl Page {
    pub fn new(name: PageName, direction: Direction) -> Self {
        Page {
            name,
            order: Vec::new(),
            sections: HashMap::new(),
            constraints: Vec::new(),
            direction,
            is_current: false,
        }
    }

    pub fn add_section(
        &mut self,
        name: SectionName,
        section: Box<dyn Section>,
        constraint: Constraint,
    ) {
        self.order.push(name);
        self.constraints.push(constraint);
        self.sections.insert(name, section);
    }

    pub fn get_page_name(&self) -> PageName {
        self.name
    }

    pub fn is_current(&self) -> bool {
        self.is_current
    }

    pub fn set_as_current_page(&mut self) {
        self.is_current = true;
    }

    pub fn unset_current_page(&mut self) {
        self.is_current = false;
    }

    #[cfg(test)]
    pub fn section(&self, name: SectionName) -> Option<&dyn Section> {
        self.sections.get(&name).map(Box::as_ref)
    }

    pub fn section_mut(&mut self, name: SectionName) -> Option<&mut Box<dyn Section>> {
        self.sections.get_mut(&name)
    }

    /// Moves focus to the next visible section, wrapping. The previous
    /// holder is blurred first. Hidden sections are skipped entirely.
    pub fn rotate_focus(&mut self) {
        let visible: Vec<SectionName> = self
            .order
            .iter()
            .copied()
            .filter(|name| !self.sections[name].is_hidden())
            .collect();
        if visible.is_empty() {
            return;
        }

        let focused_at = visible
            .iter()
            .position(|name| self.sections[name].is_focused());
        let next = match focused_at {
            Some(i) => {
                if let Some(section) = self.sections.get_mut(&visible[i]) {
                    section.blur();
                }
                visible[(i + 1) % visible.len()]
            }
            None => visible[0],
        };
        if let Some(section) = self.sections.get_mut(&next) {
            section.focus();
        }
    }

    /// Dispatches `msg` to every section in order. A section that consumes
    /// the message takes it; later sections then see `None` and no-op.
    pub fn update(&mut self, msg: &mut Option<Msg>) -> Vec<Command> {
        let mut commands = Vec::new();
        for name in &self.order {
            if let Some(section) = self.sections.get_mut(name) {
                commands.extend(section.update(msg));
            }
        }
        commands
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        for (name, rect) in self.split(area) {
            if let Some(section) = self.sections.get_mut(&name) {
                if !section.is_hidden() {
                    section.render(frame, rect);
                }
            }
        }
    }

    pub fn set_dimensions(&mut self, width: u16, height: u16) {
        for (name, rect) in self.split(Rect::new(0, 0, width, height)) {
            if let Some(section) = self.sections.get_mut(&name) {
                section.set_dimensions(rect.width, rect.height);
            }
        }
    }

    fn split(&self, area: Rect) -> Vec<(SectionName, Rect)> {
        let rects = Layout::default()
            .direction(self.direction)
            .constraints(self.constraints.clone())
            .split(area);
        self.order
            .iter()
            .copied()
            .zip(rects.iter().copied())
            .collect()
    }
}

/// LIFO stack of pages; never empty after construction.
pub struct PageStack {
    pages: Vec<Page>,
}

impl PageStack {
    pub fn new(mut root: Page) -> Self {
        root.set_as_current_page();
        PageStack { pages: vec![root] }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pushes `page`, un-marking the previous top.
    pub fn push(&mut self, mut page: Page) {
        if let Some(top) = self.pages.last_mut() {
            top.unset_current_page();
        }
        page.set_as_current_page();
        self.pages.push(page);
    }

    /// Pops the top page and re-marks the newly exposed one. The root page
    /// is never popped; call sites guard with `len()`.
    pub fn pop(&mut self) -> Option<Page> {
        if self.pages.len() <= 1 {
            return None;
        }
        let popped = self.pages.pop();
        if let Some(top) = self.pages.last_mut() {
            top.set_as_current_page();
        }
        popped
    }

    /// The current page. The stack is never empty, so this always exists.
    pub fn top_mut(&mut self) -> &mut Page {
        self.pages.last_mut().expect("page stack is never empty")
    }

    /// Dispatches a result/broadcast message to every page, bottom-up.
    pub fn update_all(&mut self, msg: &mut Option<Msg>) -> Vec<Command> {
        let mut commands = Vec::new();
        for page in &mut self.pages {
            commands.extend(page.update(msg));
        }
        commands
    }

    pub fn set_dimensions(&mut self, width: u16, height: u16) {
        for page in &mut self.pages {
            page.set_dimensions(width, height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::msg::{Command, Msg};

    struct StubSection {
        hidden: bool,
        focused: bool,
        focus_count: usize,
    }

    impl StubSection {
        fn new() -> Self {
            StubSection {
                hidden: false,
                focused: false,
                focus_count: 0,
            }
        }
    }

    impl Section for StubSection {
        fn is_hidden(&self) -> bool {
            self.hidden
        }
        fn is_focused(&self) -> bool {
            self.focused
        }
        fn hide(&mut self) {
            self.hidden = true;
        }
        fn show(&mut self) {
            self.hidden = false;
        }
        fn focus(&mut self) {
            self.hidden = false;
            self.focused = true;
            self.focus_count += 1;
        }
        fn blur(&mut self) {
            self.focused = false;
        }
        fn update(&mut self, _msg: &mut Option<Msg>) -> Vec<Command> {
            Vec::new()
        }
        fn render(&mut self, _frame: &mut Frame, _area: Rect) {}
        fn set_dimensions(&mut self, _width: u16, _height: u16) {}
    }

    fn three_section_page() -> Page {
        let mut page = Page::new(PageName::Chat, Direction::Horizontal);
        page.add_section(
            SectionName::Prompt,
            Box::new(StubSection::new()),
            Constraint::Percentage(30),
        );
        page.add_section(
            SectionName::Convo,
            Box::new(StubSection::new()),
            Constraint::Percentage(40),
        );
        page.add_section(
            SectionName::Help,
            Box::new(StubSection::new()),
            Constraint::Percentage(30),
        );
        page
    }

    fn focused_name(page: &Page) -> Option<SectionName> {
        [SectionName::Prompt, SectionName::Convo, SectionName::Help]
            .into_iter()
            .find(|&name| page.section(name).is_some_and(|s| s.is_focused()))
    }

    #[test]
    fn test_rotation_visits_each_visible_section_once() {
        let mut page = three_section_page();
        let mut seen = Vec::new();
        for _ in 0..3 {
            page.rotate_focus();
            seen.push(focused_name(&page).unwrap());
        }
        assert_eq!(
            seen,
            vec![SectionName::Prompt, SectionName::Convo, SectionName::Help]
        );

        // A full cycle wraps back to the first section.
        page.rotate_focus();
        assert_eq!(focused_name(&page), Some(SectionName::Prompt));
    }

    #[test]
    fn test_rotation_skips_hidden_sections() {
        let mut page = three_section_page();
        page.section_mut(SectionName::Convo).unwrap().hide();

        page.rotate_focus();
        assert_eq!(focused_name(&page), Some(SectionName::Prompt));
        page.rotate_focus();
        assert_eq!(focused_name(&page), Some(SectionName::Help));
    }

    #[test]
    fn test_rotation_blurs_previous_holder() {
        let mut page = three_section_page();
        page.rotate_focus();
        page.rotate_focus();
        let focused: Vec<bool> = [SectionName::Prompt, SectionName::Convo, SectionName::Help]
            .into_iter()
            .map(|name| page.section(name).unwrap().is_focused())
            .collect();
        assert_eq!(focused, vec![false, true, false]);
    }

    #[test]
    fn test_stack_push_pop_remarks_current() {
        let mut stack = PageStack::new(three_section_page());
        assert!(stack.top_mut().is_current());

        let mut overlay = Page::new(PageName::Help, Direction::Vertical);
        overlay.add_section(
            SectionName::Help,
            Box::new(StubSection::new()),
            Constraint::Percentage(100),
        );
        stack.push(overlay);
        assert_eq!(stack.top_mut().get_page_name(), PageName::Help);
        assert!(stack.top_mut().is_current());

        stack.pop();
        assert_eq!(stack.top_mut().get_page_name(), PageName::Chat);
        assert!(stack.top_mut().is_current());
    }

    #[test]
    fn test_root_page_is_never_popped() {
        let mut stack = PageStack::new(three_section_page());
        assert!(stack.pop().is_none());
        assert_eq!(stack.len(), 1);
    }
}
