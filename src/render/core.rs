use std::io::Write;

use crate::error::Result;
use crate::geometry::{Rect, Size};
use crate::view::View;
use crate::width::display_width;

/// Renderer runtime parameters.
#[derive(Debug, Clone, Default)]
pub struct RendererSettings {
    /// Where to park the cursor after a flush.
    pub restore_cursor: Option<(u16, u16)>,
}

/// ANSI escape code renderer painting views onto a terminal handle.
#[derive(Debug, Default)]
pub struct AnsiRenderer {
    settings: RendererSettings,
}

impl AnsiRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn with_default() -> Self {
        Self::new(RendererSettings::default())
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    /// Paint `views` bottom to top, clearing the screen first on a full
    /// redraw. Nothing is written when there is nothing to paint.
    pub fn render(
        &mut self,
        writer: &mut impl Write,
        size: Size,
        full_redraw: bool,
        views: &[View],
    ) -> Result<()> {
        if !full_redraw && views.is_empty() {
            return Ok(());
        }
        if full_redraw {
            write!(writer, "\x1b[2J")?;
        }
        let screen = Screen::new(size);
        for view in views {
            render_view(writer, screen, view)?;
        }

        if let Some((row, col)) = self.settings.restore_cursor {
            write!(
                writer,
                "\x1b[{};{}H",
                row.saturating_add(1),
                col.saturating_add(1)
            )?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Drawable cell range; cells outside it are skipped.
#[derive(Debug, Clone, Copy)]
struct Screen {
    width: i32,
    height: i32,
}

impl Screen {
    fn new(size: Size) -> Self {
        Self {
            width: i32::from(size.width),
            height: i32::from(size.height),
        }
    }

    fn contains_row(&self, y: i32) -> bool {
        (0..self.height).contains(&y)
    }

    /// Visible columns of `[x0, x1]`.
    fn columns(&self, x0: i32, x1: i32) -> Option<(i32, i32)> {
        let start = x0.max(0);
        let end = x1.min(self.width - 1);
        (start <= end).then_some((start, end))
    }
}

fn render_view(writer: &mut impl Write, screen: Screen, view: &View) -> Result<()> {
    let bounds = view.bounds();
    if bounds.is_empty() {
        return Ok(());
    }

    if view.frame() {
        render_frame(writer, screen, bounds)?;
    }

    let content = view.content_rect();
    if content.is_empty() {
        return Ok(());
    }
    let Some((first_col, last_col)) = screen.columns(content.x0, content.x1) else {
        return Ok(());
    };
    let skip = usize::try_from(first_col - content.x0).unwrap_or(0);
    let width = usize::try_from(last_col - first_col + 1).unwrap_or(0);

    let mut lines = view.content().lines().skip(view.origin_y());
    for y in content.y0..=content.y1 {
        let line = lines.next().unwrap_or("");
        if !screen.contains_row(y) {
            continue;
        }
        let mut clipped = clip_line(line, skip, width);
        pad_line(&mut clipped, width);
        write!(writer, "\x1b[{};{}H{}", y + 1, first_col + 1, clipped)?;
    }
    Ok(())
}

fn render_frame(writer: &mut impl Write, screen: Screen, bounds: Rect) -> Result<()> {
    let Some((first_col, last_col)) = screen.columns(bounds.x0, bounds.x1) else {
        return Ok(());
    };

    for y in bounds.y0..=bounds.y1 {
        if !screen.contains_row(y) {
            continue;
        }
        let (left, fill, right) = if y == bounds.y0 {
            ('┌', '─', '┐')
        } else if y == bounds.y1 {
            ('└', '─', '┘')
        } else {
            ('│', ' ', '│')
        };

        if fill == ' ' {
            // Interior rows only need the two side borders.
            for (x, glyph) in [(bounds.x0, left), (bounds.x1, right)] {
                if (first_col..=last_col).contains(&x) {
                    write!(writer, "\x1b[{};{}H{}", y + 1, x + 1, glyph)?;
                }
            }
            continue;
        }

        let row: String = (first_col..=last_col)
            .map(|x| {
                if x == bounds.x0 {
                    left
                } else if x == bounds.x1 {
                    right
                } else {
                    fill
                }
            })
            .collect();
        write!(writer, "\x1b[{};{}H{}", y + 1, first_col + 1, row)?;
    }
    Ok(())
}

/// Drop `skip` leading columns, then keep at most `width` columns.
fn clip_line(line: &str, skip: usize, width: usize) -> String {
    let mut out = String::new();
    let mut column = 0;
    for ch in line.chars() {
        let ch_width = display_width(ch.encode_utf8(&mut [0; 4]));
        if column + ch_width > skip + width {
            break;
        }
        if column >= skip {
            out.push(ch);
        }
        column += ch_width;
    }
    out
}

fn pad_line(line: &mut String, width: usize) {
    let display = display_width(line);
    if display < width {
        line.extend(std::iter::repeat_n(' ', width - display));
    }
}
