use eframe::egui;
use shared::domain::{ButtonVisual, Category, Reaction};

pub const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(24, 46, 32);
pub const TEXT_PANEL: egui::Color32 = egui::Color32::from_rgb(44, 110, 62);
pub const CORRECT: egui::Color32 = egui::Color32::from_rgb(52, 168, 83);
pub const WRONG: egui::Color32 = egui::Color32::from_rgb(200, 64, 56);

pub const TITLE_SIZE: f32 = 27.0;
pub const BODY_SIZE: f32 = 20.0;
pub const BUTTON_TEXT_SIZE: f32 = 28.0;

fn category_color(category: Category) -> egui::Color32 {
    match category {
        Category::Recyclable => egui::Color32::from_rgb(38, 110, 196),
        Category::Waste => egui::Color32::from_rgb(90, 90, 96),
        Category::Compostable => egui::Color32::from_rgb(130, 96, 52),
    }
}

pub fn button_fill(category: Category, visual: ButtonVisual) -> egui::Color32 {
    match visual {
        ButtonVisual::Default => category_color(category),
        ButtonVisual::Correct => CORRECT,
        ButtonVisual::Wrong => WRONG,
    }
}

pub fn button_caption(category: Category, visual: ButtonVisual) -> String {
    match visual {
        ButtonVisual::Default => category.button_label().to_string(),
        ButtonVisual::Correct => format!("✔ {}", category.button_label()),
        ButtonVisual::Wrong => format!("✖ {}", category.button_label()),
    }
}

/// Face glyph and speech line for the character panel.
pub fn reaction_face(reaction: &Reaction) -> (&'static str, String) {
    match reaction {
        Reaction::Idle => ("🤖", "Hold an item up to the camera!".to_string()),
        Reaction::Curious { item_name } => ("🤔", format!("Hmm, a {item_name}... where does it go?")),
        Reaction::Happy => ("😄", "You got it!".to_string()),
        Reaction::Sad => ("😟", "Not that one. Try again!".to_string()),
    }
}

pub fn apply(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = BACKGROUND;
    visuals.window_fill = BACKGROUND;
    ctx.set_visuals(visuals);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn judged_buttons_share_feedback_colors() {
        for category in Category::ALL {
            assert_eq!(button_fill(category, ButtonVisual::Correct), CORRECT);
            assert_eq!(button_fill(category, ButtonVisual::Wrong), WRONG);
            assert_ne!(button_fill(category, ButtonVisual::Default), CORRECT);
        }
    }

    #[test]
    fn curious_face_names_the_item() {
        let (_, line) = reaction_face(&Reaction::Curious {
            item_name: "soda can".to_string(),
        });
        assert!(line.contains("soda can"));
    }
}
