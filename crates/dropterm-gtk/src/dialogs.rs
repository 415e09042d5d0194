//! Dialog windows
//!
//! Each dialog takes the lose-focus guard of its parent window and holds it
//! until the dialog is dismissed, so the drop-down stays up meanwhile.

use std::cell::RefCell;

use gtk4::prelude::*;
use gtk4::{Align, Dialog, Entry, Label, ResponseType, Window};

use dropterm_app::visibility::InhibitGuard;

/// Show the "Rename Tab" dialog
pub fn show_rename_dialog<F>(
    parent: &impl IsA<Window>,
    current_title: &str,
    guard: InhibitGuard,
    callback: F,
) where
    F: Fn(String) + 'static,
{
    let dialog = Dialog::builder()
        .title("Rename Tab")
        .transient_for(parent)
        .modal(true)
        .build();

    dialog.add_button("Cancel", ResponseType::Cancel);
    dialog.add_button("OK", ResponseType::Ok);
    dialog.set_default_response(ResponseType::Ok);

    let content = dialog.content_area();
    content.set_spacing(12);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);

    let label = Label::new(Some("Tab title:"));
    label.set_halign(Align::Start);
    content.append(&label);

    let entry = Entry::new();
    entry.set_text(current_title);
    entry.set_hexpand(true);
    entry.set_activates_default(true);
    content.append(&entry);

    let guard = RefCell::new(Some(guard));
    let entry_clone = entry.clone();
    dialog.connect_response(move |dialog, response| {
        if response == ResponseType::Ok {
            let title = entry_clone.text().to_string();
            callback(title);
        }
        guard.borrow_mut().take();
        dialog.close();
    });

    dialog.present();
    entry.grab_focus();
}

/// Ask before quitting; `callback` runs only when confirmed
pub fn show_quit_dialog<F>(parent: &impl IsA<Window>, guard: InhibitGuard, callback: F)
where
    F: Fn() + 'static,
{
    let dialog = Dialog::builder()
        .title("Quit dropterm")
        .transient_for(parent)
        .modal(true)
        .build();

    dialog.add_button("Cancel", ResponseType::Cancel);
    dialog.add_button("Quit", ResponseType::Accept);
    dialog.set_default_response(ResponseType::Cancel);

    let content = dialog.content_area();
    content.set_spacing(12);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);

    let label = Label::new(Some(
        "Quit dropterm? All terminals and their processes will be closed.",
    ));
    label.set_wrap(true);
    label.set_halign(Align::Start);
    content.append(&label);

    let guard = RefCell::new(Some(guard));
    dialog.connect_response(move |dialog, response| {
        guard.borrow_mut().take();
        dialog.close();
        if response == ResponseType::Accept {
            callback();
        }
    });

    dialog.present();
}
