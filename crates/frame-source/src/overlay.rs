//! Annotation drawing for the monitored output stream

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use zone::{BoundingBox, ZonePolygon};

use crate::{SourceError, VideoFrame};

const ZONE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const INSIDE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const OUTSIDE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const HIGH_RISK_BANNER: Rgb<u8> = Rgb([255, 0, 0]);
const LOW_RISK_BANNER: Rgb<u8> = Rgb([255, 165, 0]);

/// Banner drawn across the top of a frame that triggered an entry event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventBanner {
    /// Entry without a helmet (red)
    HighRisk,
    /// Entry with a helmet (orange)
    LowRisk,
}

impl EventBanner {
    fn color(self) -> Rgb<u8> {
        match self {
            EventBanner::HighRisk => HIGH_RISK_BANNER,
            EventBanner::LowRisk => LOW_RISK_BANNER,
        }
    }
}

/// Person box to draw, colored by zone membership
#[derive(Debug, Clone, Copy)]
pub struct OverlayBox {
    pub bbox: BoundingBox,
    pub inside_zone: bool,
}

/// Draw the zone outline, person boxes and (on event frames) a banner onto a copy of `frame`
pub fn annotate(
    frame: &VideoFrame,
    zone: &ZonePolygon,
    boxes: &[OverlayBox],
    banner: Option<EventBanner>,
) -> Result<VideoFrame, SourceError> {
    let mut img = frame.to_rgb_image()?;

    draw_zone(&mut img, zone);
    for b in boxes {
        let color = if b.inside_zone { INSIDE_COLOR } else { OUTSIDE_COLOR };
        draw_box(&mut img, &b.bbox, color);
    }
    if let Some(banner) = banner {
        draw_banner(&mut img, banner.color());
    }

    Ok(VideoFrame::from_rgb_image(img, frame.timestamp_ns, frame.sequence))
}

fn draw_zone(img: &mut RgbImage, zone: &ZonePolygon) {
    let vertices = zone.vertices();
    for (i, a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        for offset in [0.0f32, 1.0] {
            draw_line_segment_mut(
                img,
                (a.x as f32 + offset, a.y as f32),
                (b.x as f32 + offset, b.y as f32),
                ZONE_COLOR,
            );
        }
    }
}

fn draw_box(img: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    // 2px stroke
    for inset in 0..2i64 {
        let w = (bbox.width() - 2 * inset).max(1) as u32;
        let h = (bbox.height() - 2 * inset).max(1) as u32;
        let rect = Rect::at(bbox.x1() + inset as i32, bbox.y1() + inset as i32).of_size(w, h);
        draw_hollow_rect_mut(img, rect, color);
    }
}

fn draw_banner(img: &mut RgbImage, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    let banner_h = (h / 12).max(1);
    draw_filled_rect_mut(img, Rect::at(0, 0).of_size(w.max(1), banner_h), color);
}
