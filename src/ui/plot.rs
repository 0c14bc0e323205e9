use std::f64::consts::TAU;

use eframe::egui::epaint::TextShape;
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoint, PlotPoints, Polygon, Text};

use crate::color::{coolwarm, generate_palette, text_color_for};
use crate::data::stats::{CategoryCounts, CorrelationMatrix, Distribution};
use crate::state::LabelSlices;

const CHART_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Pie chart (label distribution)
// ---------------------------------------------------------------------------

/// Slices start at 3 o'clock and run counter-clockwise, largest first.
pub fn pie_chart(ui: &mut Ui, id: &str, slices: &LabelSlices) {
    let colors = generate_palette(slices.len());

    Plot::new(id)
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .include_x(-1.4)
        .include_x(1.4)
        .include_y(-1.25)
        .include_y(1.25)
        .show(ui, |plot_ui| {
            let mut start = 0.0;
            for ((label, count, share), color) in slices.iter().zip(colors) {
                let sweep = share * TAU;
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(wedge(start, sweep)))
                        .name(format!("{label} ({count})"))
                        .fill_color(color)
                        .stroke(Stroke::new(1.0, Color32::WHITE)),
                );

                let mid = start + sweep / 2.0;
                plot_ui.text(Text::new(
                    PlotPoint::new(1.15 * mid.cos(), 1.15 * mid.sin()),
                    label.as_str(),
                ));
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(0.6 * mid.cos(), 0.6 * mid.sin()),
                        format!("{:.2}%", share * 100.0),
                    )
                    .color(text_color_for(color)),
                );
                start += sweep;
            }
        });
}

/// Closed polygon for one pie slice of the unit circle.
fn wedge(start: f64, sweep: f64) -> Vec<[f64; 2]> {
    let steps = ((sweep / TAU) * 128.0).ceil().max(2.0) as usize;
    std::iter::once([0.0, 0.0])
        .chain((0..=steps).map(|i| {
            let a = start + sweep * i as f64 / steps as f64;
            [a.cos(), a.sin()]
        }))
        .collect()
}

// ---------------------------------------------------------------------------
// Histogram with density curve
// ---------------------------------------------------------------------------

pub fn histogram(ui: &mut Ui, id: &str, dist: &Distribution) {
    let width = dist.histogram.bin_width();
    let color = generate_palette(1)[0];
    let bars: Vec<Bar> = dist
        .histogram
        .centers()
        .zip(&dist.histogram.counts)
        .map(|(x, &count)| Bar::new(x, count as f64).width(width))
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label(dist.column.as_str())
        .y_axis_label("Count")
        .include_y(0.0)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            let name = format!("{} (n = {})", dist.column, dist.histogram.total());
            plot_ui.bar_chart(BarChart::new(bars).name(name).color(color));
            if !dist.kde.is_empty() {
                let points: PlotPoints = dist.kde.iter().copied().collect();
                plot_ui.line(Line::new(points).name("KDE").color(color).width(2.0));
            }
        });
}

// ---------------------------------------------------------------------------
// Count plot (selected feature)
// ---------------------------------------------------------------------------

pub fn count_plot(ui: &mut Ui, id: &str, counts: &CategoryCounts) {
    let colors = generate_palette(counts.labels.len());
    let bars: Vec<Bar> = counts
        .labels
        .iter()
        .zip(&counts.counts)
        .zip(colors)
        .enumerate()
        .map(|(i, ((label, &count), color))| {
            Bar::new(i as f64, count as f64)
                .width(0.8)
                .name(label)
                .fill(color)
        })
        .collect();

    let labels = counts.labels.clone();
    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label(counts.column.as_str())
        .y_axis_label("count")
        .include_y(0.0)
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(&counts.column));
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

const MAX_CELL: f32 = 56.0;
const MIN_CELL: f32 = 18.0;
const COLORBAR_WIDTH: f32 = 16.0;

/// Annotated correlation grid painted directly, with a colour bar on the right.
pub fn heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    if matrix.is_empty() {
        return;
    }
    let n = matrix.len();

    let label_font = FontId::proportional(12.0);
    let value_font = FontId::proportional(if n > 12 { 9.0 } else { 11.0 });

    // Measure the widest label for both margins.
    let label_width = matrix
        .labels
        .iter()
        .map(|l| {
            ui.painter()
                .layout_no_wrap(l.clone(), label_font.clone(), Color32::WHITE)
                .size()
                .x
        })
        .fold(0.0f32, f32::max)
        + 6.0;

    let grid_budget = ui.available_width() - label_width - COLORBAR_WIDTH - 48.0;
    let cell = (grid_budget / n as f32).clamp(MIN_CELL, MAX_CELL);
    let grid_side = cell * n as f32;
    let size = Vec2::new(
        label_width + grid_side + COLORBAR_WIDTH + 48.0,
        grid_side + label_width,
    );
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min + Vec2::new(label_width, 0.0);
    let text_color = ui.visuals().text_color();

    for row in 0..n {
        // Row labels, right-aligned against the grid.
        painter.text(
            Pos2::new(origin.x - 4.0, origin.y + cell * (row as f32 + 0.5)),
            Align2::RIGHT_CENTER,
            &matrix.labels[row],
            label_font.clone(),
            text_color,
        );

        for col in 0..n {
            let r = matrix.get(row, col);
            let rect = Rect::from_min_size(
                origin + Vec2::new(cell * col as f32, cell * row as f32),
                Vec2::splat(cell),
            );
            let fill = coolwarm(r);
            painter.rect_filled(rect, 0.0, fill);
            if !r.is_nan() && cell >= 24.0 {
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    format!("{r:.2}"),
                    value_font.clone(),
                    text_color_for(fill),
                );
            }
        }
    }

    // Column labels below the grid, reading bottom to top.
    for (col, label) in matrix.labels.iter().enumerate() {
        let galley = painter.layout_no_wrap(label.clone(), label_font.clone(), text_color);
        let pos = Pos2::new(
            origin.x + cell * (col as f32 + 0.5) - galley.size().y / 2.0,
            origin.y + grid_side + 4.0 + galley.size().x,
        );
        painter.add(TextShape::new(pos, galley, text_color).with_angle(-std::f32::consts::FRAC_PI_2));
    }

    colorbar(
        &painter,
        Rect::from_min_size(
            Pos2::new(origin.x + grid_side + 12.0, origin.y),
            Vec2::new(COLORBAR_WIDTH, grid_side),
        ),
        text_color,
    );

    if let Some(hover) = response.hover_pos() {
        let rel = hover - origin;
        if rel.x >= 0.0 && rel.y >= 0.0 {
            let (row, col) = ((rel.y / cell) as usize, (rel.x / cell) as usize);
            if row < n && col < n {
                response.on_hover_text(format!(
                    "{} × {}: {:.3}",
                    matrix.labels[row],
                    matrix.labels[col],
                    matrix.get(row, col)
                ));
            }
        }
    }
}

fn colorbar(painter: &egui::Painter, rect: Rect, text_color: Color32) {
    const STEPS: usize = 64;
    let step_h = rect.height() / STEPS as f32;
    for i in 0..STEPS {
        // Top is +1, bottom is -1.
        let t = 1.0 - 2.0 * (i as f64 + 0.5) / STEPS as f64;
        let band = Rect::from_min_size(
            Pos2::new(rect.min.x, rect.min.y + step_h * i as f32),
            Vec2::new(rect.width(), step_h + 0.5),
        );
        painter.rect_filled(band, 0.0, coolwarm(t));
    }
    for (value, y) in [(1.0, rect.top()), (0.0, rect.center().y), (-1.0, rect.bottom())] {
        painter.text(
            Pos2::new(rect.right() + 4.0, y),
            Align2::LEFT_CENTER,
            format!("{value:.1}"),
            FontId::proportional(11.0),
            text_color,
        );
    }
}
