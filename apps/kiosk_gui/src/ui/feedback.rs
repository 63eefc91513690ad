//! Feedback presenter: guess buttons, character panel and the text shown
//! over the camera view.

use std::time::{Duration, Instant};

use eframe::egui;
use kiosk_core::FeedbackPresenter;
use shared::domain::{ButtonVisual, Category, Reaction};

use crate::ui::theme;

#[derive(Debug, Clone, PartialEq)]
struct Title {
    text: String,
    expires_at: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackView {
    buttons: [ButtonVisual; 3],
    reaction: Reaction,
    title: Option<Title>,
    body: Option<String>,
}

fn slot(category: Category) -> usize {
    match category {
        Category::Recyclable => 0,
        Category::Waste => 1,
        Category::Compostable => 2,
    }
}

impl FeedbackView {
    pub fn button(&self, category: Category) -> ButtonVisual {
        self.buttons[slot(category)]
    }

    pub fn reaction(&self) -> &Reaction {
        &self.reaction
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_ref().map(|title| title.text.as_str())
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn show_title_at(&mut self, text: &str, expires_after: Option<Duration>, now: Instant) {
        self.title = Some(Title {
            text: text.to_string(),
            expires_at: expires_after.map(|after| now + after),
        });
    }

    /// Drops a transient title once its time is up.
    pub fn expire(&mut self, now: Instant) {
        if self
            .title
            .as_ref()
            .and_then(|title| title.expires_at)
            .is_some_and(|deadline| now >= deadline)
        {
            self.title = None;
        }
    }

    pub fn next_expiry(&self) -> Option<Instant> {
        self.title.as_ref().and_then(|title| title.expires_at)
    }

    /// Draws the three guess buttons; returns the one pressed this frame.
    pub fn show_buttons(&self, ui: &mut egui::Ui) -> Option<Category> {
        let mut pressed = None;
        ui.columns(Category::ALL.len(), |columns| {
            for (column, category) in columns.iter_mut().zip(Category::ALL) {
                let visual = self.button(category);
                let caption = egui::RichText::new(theme::button_caption(category, visual))
                    .size(theme::BUTTON_TEXT_SIZE)
                    .strong()
                    .color(egui::Color32::WHITE);
                let button = egui::Button::new(caption)
                    .fill(theme::button_fill(category, visual))
                    .corner_radius(12.0)
                    .min_size(egui::vec2(column.available_width(), 72.0));
                if column.add(button).clicked() {
                    pressed = Some(category);
                }
            }
        });
        pressed
    }

    pub fn show_character(&self, ui: &mut egui::Ui) {
        let (face, line) = theme::reaction_face(self.reaction());
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.2);
            ui.label(egui::RichText::new(face).size(120.0));
            ui.add_space(12.0);
            ui.label(
                egui::RichText::new(line)
                    .size(theme::BODY_SIZE)
                    .color(egui::Color32::WHITE),
            );
        });
    }

    pub fn show_title_panel(&self, ui: &mut egui::Ui) {
        if let Some(text) = self.title() {
            text_panel(ui, text, theme::TITLE_SIZE);
        }
    }

    pub fn show_body_panel(&self, ui: &mut egui::Ui) {
        if let Some(text) = self.body() {
            text_panel(ui, text, theme::BODY_SIZE);
        }
    }
}

fn text_panel(ui: &mut egui::Ui, text: &str, size: f32) {
    egui::Frame::NONE
        .fill(theme::TEXT_PANEL)
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(14, 10))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(
                egui::RichText::new(text)
                    .size(size)
                    .color(egui::Color32::WHITE),
            );
        });
}

impl FeedbackPresenter for FeedbackView {
    fn set_button(&mut self, category: Category, visual: ButtonVisual) {
        self.buttons[slot(category)] = visual;
    }

    fn set_reaction(&mut self, reaction: Reaction) {
        self.reaction = reaction;
    }

    fn show_title(&mut self, text: &str, expires_after: Option<Duration>) {
        self.show_title_at(text, expires_after, Instant::now());
    }

    fn show_body(&mut self, text: &str) {
        self.body = Some(text.to_string());
    }

    fn clear_text(&mut self) {
        self.title = None;
        self.body = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_track_each_category_independently() {
        let mut view = FeedbackView::default();
        view.set_button(Category::Waste, ButtonVisual::Wrong);
        view.set_button(Category::Compostable, ButtonVisual::Correct);

        assert_eq!(view.button(Category::Recyclable), ButtonVisual::Default);
        assert_eq!(view.button(Category::Waste), ButtonVisual::Wrong);
        assert_eq!(view.button(Category::Compostable), ButtonVisual::Correct);
    }

    #[test]
    fn transient_title_expires() {
        let start = Instant::now();
        let mut view = FeedbackView::default();
        view.show_title_at("Show an item first", Some(Duration::from_millis(2000)), start);

        view.expire(start + Duration::from_millis(1999));
        assert_eq!(view.title(), Some("Show an item first"));
        assert_eq!(view.next_expiry(), Some(start + Duration::from_millis(2000)));

        view.expire(start + Duration::from_millis(2000));
        assert_eq!(view.title(), None);
    }

    #[test]
    fn persistent_title_survives_expiry_checks() {
        let start = Instant::now();
        let mut view = FeedbackView::default();
        view.show_title_at("Where does this go?", None, start);
        view.expire(start + Duration::from_secs(3600));
        assert_eq!(view.title(), Some("Where does this go?"));
    }

    #[test]
    fn clear_text_removes_title_and_body() {
        let mut view = FeedbackView::default();
        view.show_title("Correct!", None);
        view.show_body("Cans are recyclable.");
        view.clear_text();
        assert_eq!(view.title(), None);
        assert_eq!(view.body(), None);
    }
}
