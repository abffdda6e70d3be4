// Chart lifecycle and the raster backend.
//
// `ChartSlot` owns at most one live chart and always tears the old one down
// before building a replacement, so callers never juggle chart handles.
use crate::error::AppError;
use crate::types::ChartType;
use crate::view::{ChartSeries, Rgba, PRIMARY};
use log::{debug, warn};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::io::Cursor;

pub trait ChartBackend {
    type Handle;

    fn create(&mut self, series: &ChartSeries) -> Result<Self::Handle, AppError>;

    fn destroy(&mut self, handle: Self::Handle);

    /// PNG bytes of a live chart, for embedding in documents.
    fn snapshot(&mut self, handle: &Self::Handle) -> Result<Vec<u8>, AppError>;
}

pub struct ChartSlot<B: ChartBackend> {
    backend: B,
    current: Option<(B::Handle, ChartSeries)>,
}

impl<B: ChartBackend> ChartSlot<B> {
    pub fn new(backend: B) -> Self {
        ChartSlot { backend, current: None }
    }

    /// Destroy whatever is shown and draw `series` instead. On failure the
    /// slot is left empty rather than holding a half-built chart.
    pub fn replace(&mut self, series: ChartSeries) -> Result<(), AppError> {
        self.clear();
        let handle = self.backend.create(&series)?;
        debug!("chart created with {} points", series.labels.len());
        self.current = Some((handle, series));
        Ok(())
    }

    pub fn clear(&mut self) {
        if let Some((handle, _)) = self.current.take() {
            self.backend.destroy(handle);
        }
    }

    pub fn series(&self) -> Option<&ChartSeries> {
        self.current.as_ref().map(|(_, s)| s)
    }

    /// A chart exists and has at least one label.
    pub fn has_data(&self) -> bool {
        self.series().map_or(false, |s| !s.labels.is_empty())
    }

    pub fn snapshot(&mut self) -> Result<Vec<u8>, AppError> {
        match &self.current {
            Some((handle, _)) => self.backend.snapshot(handle),
            None => Err(AppError::RenderFailure("no chart to capture".into())),
        }
    }
}

impl<B: ChartBackend> Drop for ChartSlot<B> {
    fn drop(&mut self) {
        self.clear();
    }
}

/// A chart rasterized to PNG in memory.
#[derive(Debug, Clone)]
pub struct RasterChart {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Draws charts with `plotters` into an RGB buffer and keeps them as PNG.
pub struct PlottersBackend {
    width: u32,
    height: u32,
}

impl PlottersBackend {
    pub fn new(width: u32, height: u32) -> Self {
        PlottersBackend { width: width.max(200), height: height.max(150) }
    }
}

impl ChartBackend for PlottersBackend {
    type Handle = RasterChart;

    fn create(&mut self, series: &ChartSeries) -> Result<RasterChart, AppError> {
        let png = rasterize(series, self.width, self.height).map_err(|e| AppError::RenderFailure(e.to_string()))?;
        Ok(RasterChart { png, width: self.width, height: self.height })
    }

    fn destroy(&mut self, handle: RasterChart) {
        debug!("releasing {}x{} chart raster", handle.width, handle.height);
    }

    fn snapshot(&mut self, handle: &RasterChart) -> Result<Vec<u8>, AppError> {
        if handle.png.is_empty() {
            warn!("chart raster is empty");
            return Err(AppError::RenderFailure("chart image is empty".into()));
        }
        Ok(handle.png.clone())
    }
}

fn rgb(c: Rgba) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

fn rgba(c: Rgba) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, c.a)
}

/// Largest raster the backend will allocate, in pixels.
const MAX_PIXELS: usize = 16_000_000;

/// RGB buffer length for a `width` x `height` raster, if within bounds.
fn buffer_len(width: u32, height: u32) -> Option<usize> {
    let pixels = (width as usize).checked_mul(height as usize)?;
    if pixels > MAX_PIXELS {
        return None;
    }
    pixels.checked_mul(3)
}

fn rasterize(series: &ChartSeries, width: u32, height: u32) -> Result<Vec<u8>, Box<dyn Error>> {
    let len = buffer_len(width, height)
        .ok_or_else(|| format!("chart size {}x{} exceeds {} pixels", width, height, MAX_PIXELS))?;
    let mut buffer = vec![0u8; len];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        if series.chart_type.is_proportional() {
            draw_pie(series, &root)?;
        } else {
            draw_cartesian(series, &root)?;
        }
        root.present()?;
    }

    let image = image::RgbImage::from_raw(width, height, buffer).ok_or("chart buffer has the wrong size")?;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)?;
    Ok(png)
}

fn draw_cartesian(series: &ChartSeries, root: &DrawingArea<BitMapBackend, Shift>) -> Result<(), Box<dyn Error>> {
    let n = series.values.len();
    let max = series.values.iter().copied().fold(0.0_f64, f64::max);
    let min = series.values.iter().copied().fold(0.0_f64, f64::min);
    let top = if max > 0.0 { max * 1.1 } else { 1.0 };
    let bottom = if min < 0.0 { min * 1.1 } else { 0.0 };

    let ticks = series.ticks;
    let font_size = ticks.map_or(11, |t| t.font_size) as u32;
    let rotated = ticks.map_or(false, |t| t.rotation >= 60);

    let mut chart = ChartBuilder::on(root)
        .caption(&series.title, ("sans-serif", 22))
        .margin(20)
        .x_label_area_size(series.bottom_padding as u32)
        .y_label_area_size(90)
        .build_cartesian_2d((0usize..n).into_segmented(), bottom..top)?;

    let labels = &series.labels;
    let label_font = if rotated {
        ("sans-serif", font_size).into_font().transform(FontTransform::Rotate90)
    } else {
        ("sans-serif", font_size).into_font()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(series.x_title.clone().unwrap_or_default())
        .y_desc(series.y_title.clone().unwrap_or_default())
        .x_labels(n)
        .x_label_style(label_font)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => labels.get(*i).cloned().unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    let fill = series.points.first().map_or(PRIMARY, |p| p.background);
    let border = series.points.first().map_or(PRIMARY, |p| p.border);
    match series.chart_type {
        ChartType::Line => {
            chart.draw_series(LineSeries::new(
                series.values.iter().enumerate().map(|(i, v)| (SegmentValue::CenterOf(i), *v)),
                rgb(border).stroke_width(series.border_width as u32),
            ))?;
            chart.draw_series(
                series
                    .values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Circle::new((SegmentValue::CenterOf(i), *v), 4, rgb(border).filled())),
            )?;
        }
        _ => {
            chart.draw_series(
                Histogram::vertical(&chart)
                    .style(rgba(fill).filled())
                    .margin(8)
                    .data(series.values.iter().enumerate().map(|(i, v)| (i, *v))),
            )?;
        }
    }
    Ok(())
}

fn draw_pie(series: &ChartSeries, root: &DrawingArea<BitMapBackend, Shift>) -> Result<(), Box<dyn Error>> {
    let titled = root.titled(&series.title, ("sans-serif", 22))?;
    let (w, h) = titled.dim_in_pixel();
    let center = (w as i32 / 2, (h as i32 - series.bottom_padding as i32) / 2);
    let radius = (w.min(h) as f64) * 0.35;
    let colors: Vec<RGBColor> = series.points.iter().map(|p| rgb(p.background)).collect();
    // Negative slices cannot be drawn; they show as empty.
    let sizes: Vec<f64> = series.values.iter().map(|v| v.max(0.0)).collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &series.labels);
    pie.start_angle(-90.0);
    pie.label_style(("sans-serif", 14).into_font().color(&RGBColor(71, 85, 105)));
    pie.percentages(("sans-serif", 12).into_font().color(&WHITE));
    if series.chart_type == ChartType::Doughnut {
        pie.donut_hole(radius * 0.5);
    }
    titled.draw(&pie)?;
    Ok(())
}
