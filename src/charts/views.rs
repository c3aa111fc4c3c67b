//! Chart Views Module
//! The twelve predefined views and the data slice each one draws.

use crate::data::{DeriveError, DualLevelRecord, EgressosTable, Level, Sex};
use crate::stats::{self, StackedCounts};
use plotters::style::RGBColor;
use thiserror::Error;

/// Plotly's default qualitative palette, used for bar series.
pub const SERIES_PALETTE: [RGBColor; 6] = [
    RGBColor(0x63, 0x6E, 0xFA),
    RGBColor(0xEF, 0x55, 0x3B),
    RGBColor(0x00, 0xCC, 0x96),
    RGBColor(0xAB, 0x63, 0xFA),
    RGBColor(0xFF, 0xA1, 0x5A),
    RGBColor(0x19, 0xD3, 0xF3),
];

/// One color per graduation decade (1970s to 2020s).
pub const DECADE_PALETTE: [RGBColor; 6] = [
    RGBColor(0x12, 0x68, 0xAF),
    RGBColor(0x3F, 0x6C, 0x91),
    RGBColor(0x6C, 0x71, 0x73),
    RGBColor(0x99, 0x76, 0x56),
    RGBColor(0xC6, 0x7B, 0x38),
    RGBColor(0xF3, 0x80, 0x1B),
];

pub const MASTERS_SEGMENT: RGBColor = RGBColor(0x4D, 0x97, 0xC9);
pub const DOCTORATE_SEGMENT: RGBColor = RGBColor(0x0C, 0x41, 0x6C);
pub const MALE_COLOR: RGBColor = RGBColor(0, 0, 255);
pub const FEMALE_COLOR: RGBColor = RGBColor(255, 0, 0);
pub const EXPECTED_LINE: RGBColor = RGBColor(0, 128, 0);
pub const LIMIT_LINE: RGBColor = RGBColor(255, 0, 0);

pub const AGE_BINS: usize = 30;
pub const AGE_RANGE: (f64, f64) = (0.0, 60.0);

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("No data for chart '{0}'")]
    EmptySlice(String),
    #[error(transparent)]
    Data(#[from] DeriveError),
}

/// The predefined charts, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartView {
    GraduatesByYearAndLevel,
    DurationViolin(Level),
    DurationByDecade(Level),
    GraduatesBySexAndYear(Level),
    AgeHistogram(Level),
    AgeBySex(Level),
    DualLevelTimeline,
}

impl ChartView {
    pub fn all() -> Vec<ChartView> {
        let mut views = vec![ChartView::GraduatesByYearAndLevel];
        views.extend(Level::ALL.map(ChartView::DurationViolin));
        views.extend(Level::ALL.map(ChartView::DurationByDecade));
        views.extend(Level::ALL.map(ChartView::GraduatesBySexAndYear));
        views.extend(Level::ALL.map(ChartView::AgeHistogram));
        views.extend(Level::ALL.map(ChartView::AgeBySex));
        views.push(ChartView::DualLevelTimeline);
        views
    }

    pub fn title(&self) -> String {
        match self {
            ChartView::GraduatesByYearAndLevel => "Número de Graduados por Ano e Nível".to_string(),
            ChartView::DurationViolin(level) => {
                format!("Tempo de Graduação para {}", level.title())
            }
            ChartView::DurationByDecade(level) => {
                format!("Tempo de Graduação para {} por Década", level.title())
            }
            ChartView::GraduatesBySexAndYear(level) => {
                format!("Graduados por Sexo e Ano -- {}", level.title())
            }
            ChartView::AgeHistogram(level) => {
                format!("Distribuição da Idade na Graduação ({})", level.title())
            }
            ChartView::AgeBySex(level) => format!("Idade na Graduação ({})", level.short()),
            ChartView::DualLevelTimeline => {
                "Linha do Tempo para Egressos que Cursaram os Dois Níveis".to_string()
            }
        }
    }

    /// File name (without extension) used when the view is exported.
    pub fn file_stem(&self) -> String {
        let position = ChartView::all()
            .iter()
            .position(|v| v == self)
            .unwrap_or_default()
            + 1;
        let name = match self {
            ChartView::GraduatesByYearAndLevel => "graduados_ano_nivel".to_string(),
            ChartView::DurationViolin(level) => format!("tempo_{}", level.short().to_lowercase()),
            ChartView::DurationByDecade(level) => {
                format!("tempo_decada_{}", level.short().to_lowercase())
            }
            ChartView::GraduatesBySexAndYear(level) => {
                format!("sexo_ano_{}", level.short().to_lowercase())
            }
            ChartView::AgeHistogram(level) => format!("idade_{}", level.short().to_lowercase()),
            ChartView::AgeBySex(level) => format!("idade_sexo_{}", level.short().to_lowercase()),
            ChartView::DualLevelTimeline => "linha_do_tempo".to_string(),
        };
        format!("{:02}_{}", position, name)
    }
}

/// Horizontal reference lines over a duration chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceLines {
    pub expected: f64,
    pub limit: f64,
}

impl ReferenceLines {
    pub fn for_level(level: Level) -> Self {
        let (expected, limit) = level.duration_thresholds();
        Self { expected, limit }
    }
}

/// One violin: its category label, values and line color.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolinGroup {
    pub label: String,
    pub values: Vec<f64>,
    pub color: RGBColor,
}

/// Data slice drawn by a view.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    StackedBar(StackedCounts),
    Violins {
        groups: Vec<ViolinGroup>,
        reference: Option<ReferenceLines>,
        show_points: bool,
    },
    Histogram {
        values: Vec<f64>,
        bins: usize,
        range: (f64, f64),
    },
    /// Two half violins sharing one axis: `left` on the negative side.
    SplitViolin {
        left: ViolinGroup,
        right: ViolinGroup,
    },
    Timeline(Vec<DualLevelRecord>),
}

/// A view with its data, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedChart {
    pub view: ChartView,
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub data: ChartData,
}

/// Select and aggregate the slice of the table a view draws.
pub fn prepare(
    view: ChartView,
    table: &EgressosTable,
    dual_level: &[DualLevelRecord],
) -> Result<PreparedChart, ViewError> {
    let title = view.title();
    let non_empty = |values: Vec<f64>| {
        if values.is_empty() {
            Err(ViewError::EmptySlice(title.clone()))
        } else {
            Ok(values)
        }
    };

    let (x_desc, y_desc, data) = match view {
        ChartView::GraduatesByYearAndLevel => {
            let counts = stats::count_by_year_and_level(table)?;
            let order = Level::ALL.map(|l| l.label());
            (
                "Ano da Graduação",
                "Número",
                ChartData::StackedBar(StackedCounts::pivot(&counts, &order)),
            )
        }
        ChartView::DurationViolin(level) => {
            let values = non_empty(table.months_to_graduation(level)?)?;
            (
                "",
                "Meses",
                ChartData::Violins {
                    groups: vec![ViolinGroup {
                        label: level.title().to_string(),
                        values,
                        color: SERIES_PALETTE[0],
                    }],
                    reference: Some(ReferenceLines::for_level(level)),
                    show_points: true,
                },
            )
        }
        ChartView::DurationByDecade(level) => {
            let groups: Vec<ViolinGroup> = stats::months_by_decade(table, level)?
                .into_iter()
                .map(|decade| ViolinGroup {
                    label: decade.label(),
                    color: DECADE_PALETTE[decade.index % DECADE_PALETTE.len()],
                    values: decade.values,
                })
                .collect();
            if groups.is_empty() {
                return Err(ViewError::EmptySlice(view.title()));
            }
            (
                "Década",
                "Meses",
                ChartData::Violins {
                    groups,
                    reference: Some(ReferenceLines::for_level(level)),
                    show_points: false,
                },
            )
        }
        ChartView::GraduatesBySexAndYear(level) => {
            let counts = stats::count_by_year_and_sex(table, level)?;
            if counts.is_empty() {
                return Err(ViewError::EmptySlice(view.title()));
            }
            (
                "Ano",
                "Número de Egressos",
                ChartData::StackedBar(StackedCounts::pivot(&counts, &[])),
            )
        }
        ChartView::AgeHistogram(level) => {
            let values = non_empty(table.ages_at_graduation(level)?)?;
            (
                "Idade na Graduação",
                "Contagem",
                ChartData::Histogram {
                    values,
                    bins: AGE_BINS,
                    range: AGE_RANGE,
                },
            )
        }
        ChartView::AgeBySex(level) => {
            let male = table.ages_at_graduation_for(level, Sex::Male)?;
            let female = table.ages_at_graduation_for(level, Sex::Female)?;
            if male.is_empty() && female.is_empty() {
                return Err(ViewError::EmptySlice(view.title()));
            }
            (
                "",
                "Idade em Anos",
                ChartData::SplitViolin {
                    left: ViolinGroup {
                        label: Sex::Female.label().to_string(),
                        values: female,
                        color: FEMALE_COLOR,
                    },
                    right: ViolinGroup {
                        label: Sex::Male.label().to_string(),
                        values: male,
                        color: MALE_COLOR,
                    },
                },
            )
        }
        ChartView::DualLevelTimeline => {
            let mut records = dual_level.to_vec();
            records.sort_by(|a, b| {
                a.masters_admission
                    .cmp(&b.masters_admission)
                    .then_with(|| a.name.cmp(&b.name))
            });
            ("Ano", "", ChartData::Timeline(records))
        }
    };

    Ok(PreparedChart {
        view,
        title: view.title(),
        x_desc: x_desc.to_string(),
        y_desc: y_desc.to_string(),
        data,
    })
}

/// Prepare every view, failing on the first empty or broken slice.
pub fn prepare_all(
    table: &EgressosTable,
    dual_level: &[DualLevelRecord],
) -> Result<Vec<PreparedChart>, ViewError> {
    ChartView::all()
        .into_iter()
        .map(|view| prepare(view, table, dual_level))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_twelve_distinct_views() {
        let views = ChartView::all();
        assert_eq!(views.len(), 12);
        let stems: HashSet<String> = views.iter().map(|v| v.file_stem()).collect();
        assert_eq!(stems.len(), 12);
        assert_eq!(views[0].file_stem(), "01_graduados_ano_nivel");
        assert_eq!(views[11].file_stem(), "12_linha_do_tempo");
    }

    #[test]
    fn test_titles() {
        assert_eq!(
            ChartView::DurationViolin(Level::Masters).title(),
            "Tempo de Graduação para Mestrado"
        );
        assert_eq!(
            ChartView::GraduatesBySexAndYear(Level::Doctorate).title(),
            "Graduados por Sexo e Ano -- Doutorado"
        );
        assert_eq!(
            ChartView::AgeBySex(Level::Masters).title(),
            "Idade na Graduação (MSc)"
        );
    }

    #[test]
    fn test_reference_lines_follow_level() {
        let lines = ReferenceLines::for_level(Level::Doctorate);
        assert_eq!((lines.expected, lines.limit), (48.0, 60.0));
    }
}
