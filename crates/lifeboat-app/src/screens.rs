//! Screen composition.
//!
//! Whole-screen draw functions over the console's staging surface. Two
//! screens exist: the graphics-only background (title, log tail, progress
//! bar) shown during silent operation, and the full menu. Item rows are
//! recorded while drawing so touch events can be hit-tested against what
//! is actually on screen.

use std::collections::VecDeque;

use lifeboat_gfx::gradient::GradientFill;
use lifeboat_gfx::text::TextLayout;
use lifeboat_gfx::{CornerMask, DitherMode, Surface};
use lifeboat_types::color::Palette;
use lifeboat_types::font;
use lifeboat_types::geom::Rect;

use crate::console::RecoveryConsole;

/// Menu model: optional header lines, selectable items, and the rows they
/// were last drawn at.
pub struct Menu {
    pub headers: Vec<String>,
    pub items: Vec<String>,
    pub selected: usize,
    rows: Vec<Rect>,
    touch_armed: Option<usize>,
}

impl Menu {
    pub fn new(headers: Vec<String>, items: Vec<String>) -> Menu {
        Menu {
            headers,
            items,
            selected: 0,
            rows: Vec::new(),
            touch_armed: None,
        }
    }

    pub fn move_up(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = if self.selected == 0 {
            self.items.len() - 1
        } else {
            self.selected - 1
        };
    }

    pub fn move_down(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.items.len();
    }

    /// Item index under a screen point. Valid after a draw.
    pub fn hit(&self, x: i32, y: i32) -> Option<usize> {
        self.rows.iter().position(|r| r.contains(x, y))
    }

    /// Where item `index` was last drawn.
    pub fn row_rect(&self, index: usize) -> Option<Rect> {
        self.rows.get(index).copied()
    }

    /// Touch press: select and arm the item under the finger.
    pub fn touch_down(&mut self, x: i32, y: i32) {
        self.touch_armed = self.hit(x, y);
        if let Some(i) = self.touch_armed {
            self.selected = i;
        }
    }

    /// Touch release: the armed item activates only if the finger lifts
    /// on it, so a drag off the row cancels.
    pub fn touch_up(&mut self, x: i32, y: i32) -> Option<usize> {
        let armed = self.touch_armed.take();
        match (armed, self.hit(x, y)) {
            (Some(a), Some(b)) if a == b => Some(a),
            _ => None,
        }
    }
}

/// Draw the full menu screen.
pub fn draw_menu(console: &mut RecoveryConsole, menu: &mut Menu) {
    let progress = console.progress();
    let RecoveryConsole {
        staging,
        palette,
        gradient,
        catalog,
        log_lines,
        scale,
        dither,
        ..
    } = console;
    let scale = *scale;
    let dither = *dither;
    let layout = TextLayout::new(palette, scale);
    let width = staging.width();
    let height = staging.height();
    let m = (font::GLYPH_WIDTH * scale) as i32;
    let content_w = width.saturating_sub(2 * m as u32);
    let lh = layout.line_height();

    staging.clear(palette.background);

    let mut y = m;
    let title = format!("<center>{}", catalog.get("title"));
    y += layout.render_block(staging, &title, Rect::new(m, y, content_w, lh)) as i32;
    let build = format!(
        "<center><dim>lifeboat {} - {}",
        env!("CARGO_PKG_VERSION"),
        catalog.locale()
    );
    y += layout.render_block(staging, &build, Rect::new(m, y, content_w, lh)) as i32;
    y += (lh / 2) as i32;

    for header in &menu.headers {
        y += layout.render_block(staging, header, Rect::new(m, y, content_w, lh * 4)) as i32;
    }
    if !menu.headers.is_empty() {
        y += (lh / 2) as i32;
    }

    let pad = (2 * scale) as i32;
    let inset = (font::GLYPH_WIDTH * scale / 2) as i32;
    let row_h = lh + 2 * pad as u32;
    menu.rows.clear();
    for (i, item) in menu.items.iter().enumerate() {
        let row = Rect::new(m, y, content_w, row_h);
        let text_rect = Rect::new(
            row.x + inset,
            row.y + pad,
            content_w.saturating_sub(2 * inset as u32),
            lh,
        );
        if i == menu.selected {
            gradient.fill(
                staging,
                row,
                palette.accent,
                palette.highlight,
                3 * scale,
                CornerMask::all(),
                dither,
            );
            layout.render_block(staging, &format!("<inverse><b>{item}"), text_rect);
        } else {
            layout.render_block(staging, item, text_rect);
        }
        menu.rows.push(row);
        y += row_h as i32 + pad;
    }

    y += (lh / 2) as i32;
    y += layout.render_block(
        staging,
        catalog.get("menu.hint"),
        Rect::new(m, y, content_w, lh),
    ) as i32;
    y += (lh / 2) as i32;

    let bottom = if progress.is_some() {
        progress_outer(width, height, scale).y - m
    } else {
        height as i32 - m
    };
    draw_log_tail(staging, &layout, log_lines, m, y, content_w, bottom);

    if let Some(f) = progress {
        draw_progress_bar(staging, palette, gradient, scale, dither, f);
    }
}

/// Draw the graphics-only screen: title block, log tail when the text UI
/// is visible, progress bar when an operation is running.
pub fn draw_background(console: &mut RecoveryConsole) {
    let show_logs = console.text_visible();
    let progress = console.progress();
    let RecoveryConsole {
        staging,
        palette,
        gradient,
        catalog,
        log_lines,
        scale,
        dither,
        ..
    } = console;
    let scale = *scale;
    let dither = *dither;
    let layout = TextLayout::new(palette, scale);
    let width = staging.width();
    let height = staging.height();
    let m = (font::GLYPH_WIDTH * scale) as i32;
    let content_w = width.saturating_sub(2 * m as u32);
    let lh = layout.line_height();

    staging.clear(palette.background);

    let mut y = (height / 3) as i32;
    let title = format!("<center>{}", catalog.get("title"));
    y += layout.render_block(staging, &title, Rect::new(m, y, content_w, lh)) as i32;
    let build = format!("<center><dim>lifeboat {}", env!("CARGO_PKG_VERSION"));
    y += layout.render_block(staging, &build, Rect::new(m, y, content_w, lh)) as i32;
    y += lh as i32;

    if show_logs {
        let bottom = if progress.is_some() {
            progress_outer(width, height, scale).y - m
        } else {
            height as i32 - m
        };
        draw_log_tail(staging, &layout, log_lines, m, y, content_w, bottom);
    }

    if let Some(f) = progress {
        draw_progress_bar(staging, palette, gradient, scale, dither, f);
    }
}

/// Outer frame of the progress bar, anchored to the bottom margin.
pub(crate) fn progress_outer(width: u32, height: u32, scale: u32) -> Rect {
    let m = (font::GLYPH_WIDTH * scale) as i32;
    let bar_h = font::GLYPH_HEIGHT * scale;
    Rect::new(
        m,
        height as i32 - m - bar_h as i32,
        width.saturating_sub(2 * m as u32),
        bar_h,
    )
}

/// Fill area inside the progress bar frame.
pub(crate) fn progress_inner(width: u32, height: u32, scale: u32) -> Rect {
    let outer = progress_outer(width, height, scale);
    let b = scale as i32;
    Rect::new(
        outer.x + b,
        outer.y + b,
        outer.w.saturating_sub(2 * b as u32),
        outer.h.saturating_sub(2 * b as u32),
    )
}

fn draw_progress_bar(
    staging: &mut Surface,
    palette: &Palette,
    gradient: &mut GradientFill,
    scale: u32,
    dither: DitherMode,
    fraction: f32,
) {
    let outer = progress_outer(staging.width(), staging.height(), scale);
    let inner = progress_inner(staging.width(), staging.height(), scale);
    staging.fill_rect(outer, palette.border);
    staging.fill_rect(inner, palette.panel);
    let filled = (inner.w as f32 * fraction.clamp(0.0, 1.0)).round() as u32;
    if filled > 0 {
        gradient.fill(
            staging,
            Rect::new(inner.x, inner.y, filled.min(inner.w), inner.h),
            palette.progress,
            palette.accent,
            0,
            CornerMask::empty(),
            dither,
        );
    }
}

fn draw_log_tail(
    staging: &mut Surface,
    layout: &TextLayout<'_>,
    log_lines: &VecDeque<String>,
    x: i32,
    top: i32,
    width: u32,
    bottom: i32,
) {
    let lh = layout.line_height() as i32;
    if bottom <= top || width == 0 || lh == 0 {
        return;
    }
    let fit = ((bottom - top) / lh) as usize;
    if fit == 0 {
        return;
    }
    let skip = log_lines.len().saturating_sub(fit);
    let mut y = top;
    for line in log_lines.iter().skip(skip) {
        layout.render_block(staging, line, Rect::new(x, y, width, lh as u32));
        y += lh;
    }
}
