//! The root of the construct tree: collects charts and writes manifests

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::chart::{to_yaml_documents, Chart};
use crate::error::{Error, Result};

/// How synthesized objects are split into files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum YamlOutputType {
    /// `<chart-id><ext>`, all of a chart's objects in one file
    #[default]
    FilePerChart,
    /// `<chart-id>/<Kind>.<name><ext>`, one object per file
    FilePerResource,
}

/// App-wide settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppProps {
    pub outdir: PathBuf,
    pub output_file_extension: String,
    pub yaml_output_type: YamlOutputType,
}

impl Default for AppProps {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("dist"),
            output_file_extension: ".k8s.yaml".to_string(),
            yaml_output_type: YamlOutputType::default(),
        }
    }
}

/// A set of charts synthesized together.
#[derive(Debug, Clone, Default)]
pub struct App {
    props: AppProps,
    charts: Vec<Chart>,
}

impl App {
    pub fn new(props: AppProps) -> Self {
        Self {
            props,
            charts: Vec::new(),
        }
    }

    pub fn outdir(&self) -> &Path {
        &self.props.outdir
    }

    /// Take ownership of `chart`. Chart ids must be unique within the app.
    pub fn add_chart(&mut self, chart: Chart) -> Result<&mut Chart> {
        if self.charts.iter().any(|c| c.id() == chart.id()) {
            return Err(Error::DuplicateId {
                scope: "app".to_string(),
                id: chart.id().to_string(),
            });
        }
        self.charts.push(chart);
        let index = self.charts.len() - 1;
        Ok(&mut self.charts[index])
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub fn chart(&self, id: &str) -> Option<&Chart> {
        self.charts.iter().find(|c| c.id() == id)
    }

    pub fn chart_mut(&mut self, id: &str) -> Option<&mut Chart> {
        self.charts.iter_mut().find(|c| c.id() == id)
    }

    /// Render every chart. Returns `(path relative to outdir, yaml)` pairs.
    pub fn synth_yaml(&self) -> Result<Vec<(PathBuf, String)>> {
        let ext = &self.props.output_file_extension;
        let mut files = Vec::new();

        for chart in &self.charts {
            match self.props.yaml_output_type {
                YamlOutputType::FilePerChart => {
                    let path = PathBuf::from(format!("{}{}", chart.id(), ext));
                    files.push((path, chart.to_yaml()?));
                }
                YamlOutputType::FilePerResource => {
                    for object in chart.objects() {
                        let path = Path::new(chart.id())
                            .join(format!("{}.{}{}", object.kind(), object.name(), ext));
                        files.push((path, to_yaml_documents(&[object.to_json()?])?));
                    }
                }
            }
        }

        Ok(files)
    }

    /// Write every chart under `outdir`. Returns the written paths.
    pub fn synth(&self) -> Result<Vec<PathBuf>> {
        let files = self.synth_yaml()?;
        let mut written = Vec::with_capacity(files.len());

        fs::create_dir_all(&self.props.outdir)?;
        for (relative, yaml) in files {
            let path = self.props.outdir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, yaml)?;
            info!(path = %path.display(), "wrote manifest");
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::ChartProps;
    use assert_matches::assert_matches;
    use k8s_openapi::api::core::v1::ConfigMap;

    fn props(outdir: &Path, yaml_output_type: YamlOutputType) -> AppProps {
        AppProps {
            outdir: outdir.to_path_buf(),
            yaml_output_type,
            ..Default::default()
        }
    }

    fn chart(id: &str) -> Chart {
        let mut chart = Chart::new(
            id,
            ChartProps {
                disable_resource_name_hashes: true,
                ..Default::default()
            },
        );
        chart.add("a", ConfigMap::default()).unwrap();
        chart.add("b", ConfigMap::default()).unwrap();
        chart
    }

    #[test]
    fn test_duplicate_chart_rejected() {
        let mut app = App::default();
        app.add_chart(chart("web")).unwrap();
        assert_matches!(app.add_chart(chart("web")), Err(Error::DuplicateId { .. }));
    }

    #[test]
    fn test_file_per_chart() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(props(dir.path(), YamlOutputType::FilePerChart));
        app.add_chart(chart("web")).unwrap();
        app.add_chart(chart("db")).unwrap();

        let written = app.synth().unwrap();
        assert_eq!(
            written,
            vec![dir.path().join("web.k8s.yaml"), dir.path().join("db.k8s.yaml")]
        );
        let content = fs::read_to_string(&written[0]).unwrap();
        assert!(content.contains("name: web-a"));
        assert!(content.contains("name: web-b"));
    }

    #[test]
    fn test_file_per_resource() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(props(dir.path(), YamlOutputType::FilePerResource));
        app.add_chart(chart("web")).unwrap();

        let written = app.synth().unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("web").join("ConfigMap.web-a.k8s.yaml").exists());
        assert!(dir.path().join("web").join("ConfigMap.web-b.k8s.yaml").exists());
    }

    #[test]
    fn test_chart_mut_allows_late_registration() {
        let mut app = App::default();
        app.add_chart(chart("web")).unwrap();
        app.chart_mut("web")
            .unwrap()
            .add("c", ConfigMap::default())
            .unwrap();
        assert_eq!(app.chart("web").unwrap().objects().len(), 3);
    }
}
