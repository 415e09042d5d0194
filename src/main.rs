//! dropterm - a drop-down terminal emulator
//!
//! Thin entry point that hands control to the GTK4 frontend.

fn main() {
    dropterm_gtk::run();
}
