//! Chart Viewer Widget
//! Central panel showing the selected chart as a texture.

use crate::charts::PreparedChart;
use egui::{ColorImage, RichText, TextureHandle, TextureOptions};
use image::RgbImage;

/// One rendered chart and its lazily uploaded texture.
struct ChartSlot {
    chart: PreparedChart,
    image: ColorImage,
    texture: Option<TextureHandle>,
}

/// Displays one rendered chart at a time, scaled to the available space.
#[derive(Default)]
pub struct ChartViewer {
    slots: Vec<ChartSlot>,
    pub selected: usize,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.selected = 0;
    }

    /// Replace the charts; textures are created on first display.
    pub fn set_charts(&mut self, charts: Vec<PreparedChart>, images: Vec<RgbImage>) {
        self.slots = charts
            .into_iter()
            .zip(images)
            .map(|(chart, img)| ChartSlot {
                chart,
                image: to_color_image(&img),
                texture: None,
            })
            .collect();
        if self.selected >= self.slots.len() {
            self.selected = 0;
        }
    }

    pub fn charts(&self) -> Vec<PreparedChart> {
        self.slots.iter().map(|s| s.chart.clone()).collect()
    }

    pub fn titles(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.chart.title.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn show(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let Some(slot) = self.slots.get_mut(self.selected) else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        let texture = slot.texture.get_or_insert_with(|| {
            ctx.load_texture(
                slot.chart.view.file_stem(),
                slot.image.clone(),
                TextureOptions::LINEAR,
            )
        });

        ui.centered_and_justified(|ui| {
            ui.add(egui::Image::new(&*texture).shrink_to_fit());
        });
    }
}

fn to_color_image(img: &RgbImage) -> ColorImage {
    ColorImage::from_rgb(
        [img.width() as usize, img.height() as usize],
        img.as_raw(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_image_keeps_size_and_pixels() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgb([10, 20, 30]));
        let color = to_color_image(&img);
        assert_eq!(color.size, [3, 2]);
        assert_eq!(color.pixels[5], egui::Color32::from_rgb(10, 20, 30));
    }
}
