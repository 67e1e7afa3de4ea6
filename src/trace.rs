use crate::common::*;
use plotters::prelude::*;

/// Per-step loss history, kept only for the post-run chart.
#[derive(Debug, Clone, Default)]
pub struct LossTrace {
    pub content: Vec<f64>,
    pub style: Vec<f64>,
    pub total: Vec<f64>,
}

impl LossTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, content: f64, style: f64, total: f64) {
        self.content.push(content);
        self.style.push(style);
        self.total.push(total);
    }

    pub fn len(&self) -> usize {
        self.total.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }

    /// Renders the three loss curves into one line chart.
    pub fn render<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        ensure!(!self.is_empty(), "loss trace is empty");

        let path = path.as_ref();
        let root = BitMapBackend::new(path, (960, 600)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|err| anyhow!("chart backend error: {}", err))?;

        let y_max = self
            .content
            .iter()
            .chain(&self.style)
            .chain(&self.total)
            .cloned()
            .fold(0.0, f64::max)
            .max(f64::MIN_POSITIVE);

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption("Optimization losses", ("sans-serif", 24.0))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0..self.len() as i64, 0.0..y_max * 1.05)
            .map_err(|err| anyhow!("chart build error: {}", err))?;

        chart
            .configure_mesh()
            .x_desc("step")
            .y_desc("loss")
            .draw()
            .map_err(|err| anyhow!("chart mesh error: {}", err))?;

        for (label, series, color) in [
            ("content", &self.content, &RED),
            ("style", &self.style, &BLUE),
            ("total", &self.total, &GREEN),
        ] {
            chart
                .draw_series(LineSeries::new(
                    series
                        .iter()
                        .enumerate()
                        .map(|(step, loss)| (step as i64, *loss)),
                    color,
                ))
                .map_err(|err| anyhow!("chart series error: {}", err))?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|err| anyhow!("chart legend error: {}", err))?;

        root.present()
            .map_err(|err| anyhow!("unable to write chart {}: {}", path.display(), err))?;

        Ok(())
    }
}
