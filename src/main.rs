// GUI-subsystem binary: no console window is ever allocated by Windows.
#![windows_subsystem = "windows"]
#![allow(dead_code)] // palette/tool API surface kept for future tools

mod app;
mod buffer;
mod canvas;
mod components;
pub mod logger;

use app::PixelPlaceApp;
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites previous session log)
    logger::init();

    // Define the native window options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("PixelPlace"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "PixelPlace",
        options,
        Box::new(|cc| Box::new(PixelPlaceApp::new(cc))),
    )
}
