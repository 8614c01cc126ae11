//! Draws the live-view overlay: ROI, person boxes, counters and status.
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::counting::domain::counting_state::CountSnapshot;
use crate::shared::frame::Frame;
use crate::shared::gender::GenderPrediction;
use crate::shared::geometry::{BoundingBox, PixelRect};
use crate::tracking::domain::track_store::TrackId;

const RED: Rgb<u8> = Rgb([255, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);

const ROI_ALPHA: f32 = 0.1;
const PAUSED_BORDER: u32 = 4;

/// One person box as it should appear on the live frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotatedPerson {
    pub bbox: BoundingBox,
    pub track_id: TrackId,
    pub counted: bool,
    pub prediction: Option<GenderPrediction>,
}

/// Everything the overlay shows for one frame.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub roi: Option<PixelRect>,
    /// Set while detection is paused; drawn in red with a red border.
    pub status: Option<&'static str>,
    pub people: Vec<AnnotatedPerson>,
    pub counts: CountSnapshot,
}

/// Renders overlays onto frames. Text needs a font; without one only
/// shapes are drawn.
pub struct FrameAnnotator {
    font: Option<FontVec>,
}

impl FrameAnnotator {
    pub fn new() -> Self {
        Self { font: None }
    }

    pub fn with_font_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("Failed to read font {}: {e}", path.display()))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| format!("Invalid font {}: {e}", path.display()))?;
        Ok(Self { font: Some(font) })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn annotate(&self, frame: Frame, overlay: &Overlay) -> Result<Frame, Box<dyn std::error::Error>> {
        let index = frame.index();
        let mut img = RgbImage::from_raw(frame.width(), frame.height(), frame.into_data())
            .ok_or("Frame is not a packed RGB image")?;

        if let Some(roi) = overlay.roi {
            blend_rect(&mut img, &roi, BLUE, ROI_ALPHA);
            draw_hollow_rect_mut(&mut img, to_rect(&roi), BLUE);
        }

        for person in &overlay.people {
            self.draw_person(&mut img, person);
        }

        match overlay.status {
            Some(status) => {
                draw_border(&mut img, RED, PAUSED_BORDER);
                self.text(&mut img, RED, 30, 20, 32.0, status);
            }
            None => {
                let c = &overlay.counts;
                let total = format!(
                    "Total Count: {} (M:{}+F:{})",
                    c.total_count, c.male_count, c.female_count
                );
                self.text(&mut img, GREEN, 30, 20, 28.0, &total);
                let in_roi = format!("Current in ROI: {}", c.current_in_roi);
                self.text(&mut img, YELLOW, 30, 60, 28.0, &in_roi);
            }
        }

        let (width, height) = img.dimensions();
        Ok(Frame::new(img.into_raw(), width, height, 3, index))
    }

    fn draw_person(&self, img: &mut RgbImage, person: &AnnotatedPerson) {
        let (w, h) = img.dimensions();
        let Some(rect) = person.bbox.padded_within(0.0, w, h) else {
            return;
        };
        let color = if person.counted { GREEN } else { RED };
        draw_hollow_rect_mut(img, to_rect(&rect), color);

        let label = match person.prediction {
            Some(p) => format!("{} {} {:.2}", person.track_id, p.gender, p.confidence),
            None => format!("{}:{:.2}", person.track_id, person.bbox.confidence),
        };
        let y = rect.y.saturating_sub(20) as i32;
        self.text(img, color, rect.x as i32, y, 18.0, &label);
    }

    fn text(&self, img: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, size: f32, text: &str) {
        if let Some(font) = &self.font {
            draw_text_mut(img, color, x, y, PxScale::from(size), font, text);
        }
    }
}

impl Default for FrameAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

fn to_rect(rect: &PixelRect) -> Rect {
    Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height)
}

fn blend_rect(img: &mut RgbImage, rect: &PixelRect, color: Rgb<u8>, alpha: f32) {
    let x_end = rect.x_end().min(img.width());
    let y_end = rect.y_end().min(img.height());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            let px = img.get_pixel_mut(x, y);
            for c in 0..3 {
                let blended = px.0[c] as f32 * (1.0 - alpha) + color.0[c] as f32 * alpha;
                px.0[c] = blended.round() as u8;
            }
        }
    }
}

fn draw_border(img: &mut RgbImage, color: Rgb<u8>, thickness: u32) {
    let (w, h) = img.dimensions();
    for i in 0..thickness.min(w / 2).min(h / 2) {
        let rect = Rect::at(i as i32, i as i32).of_size(w - 2 * i, h - 2 * i);
        draw_hollow_rect_mut(img, rect, color);
    }
}
