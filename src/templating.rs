//! Rendering configuration files and restarting the services that read them

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ex::fs;
use handlebars::{no_escape, Handlebars};
use log::{debug, info, trace};

use crate::adapters::AdapterView;
use crate::cmd::{args, Runner};
use crate::error::CharmError;
use crate::release::Release;

/// Finds templates, preferring the newest release-specific copy
///
/// For a unit on `train`, `templates/train/` is searched first, then `templates/stein/`,
/// `templates/rocky/` and so on, and finally `templates/` itself.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    search_path: Vec<PathBuf>,
}

impl TemplateLoader {
    pub fn new<P: Into<PathBuf>>(templates_dir: P, release: Release) -> Self {
        let templates_dir = templates_dir.into();
        let mut search_path: Vec<PathBuf> = Release::all()
            .filter(|r| *r <= release)
            .map(|r| templates_dir.join(r.to_string()))
            .collect();
        search_path.reverse();
        search_path.push(templates_dir);

        Self { search_path }
    }

    pub fn find(&self, name: &str) -> Option<PathBuf> {
        self.search_path
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    }
}

/// Path to a config file along with its freshly rendered contents
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedConfigFile {
    pub path: PathBuf,
    pub rendered: String,
}

impl RenderedConfigFile {
    /// Whether the file on disk already has exactly this content
    fn is_current(&self) -> bool {
        match fs::read(&self.path) {
            Ok(existing) => existing == self.rendered.as_bytes(),
            Err(_) => false,
        }
    }

    fn write_to_disk(&self) -> Result<(), CharmError> {
        if let Some(dirname) = self.path.parent() {
            fs::create_dir_all(dirname)?;
        }

        fs::write(&self.path, self.rendered.as_bytes())?;
        Ok(())
    }
}

/// Name of the template a target file is rendered from
fn template_name(target: &Path) -> String {
    target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// The restart map with every target moved under `root`
pub fn rooted(
    restart_map: &BTreeMap<PathBuf, Vec<String>>,
    root: &Path,
) -> BTreeMap<PathBuf, Vec<String>> {
    restart_map
        .iter()
        .map(|(path, services)| {
            let relative = path.strip_prefix("/").unwrap_or(path);
            (root.join(relative), services.clone())
        })
        .collect()
}

/// Render every target in the restart map
///
/// Nothing is written here. Any template that fails to load or render fails the whole batch.
pub fn render_configs(
    loader: &TemplateLoader,
    view: &AdapterView,
    restart_map: &BTreeMap<PathBuf, Vec<String>>,
) -> Result<Vec<RenderedConfigFile>, CharmError> {
    let mut registry = Handlebars::new();
    registry.register_escape_fn(no_escape);

    debug!("Building template registry");
    for target in restart_map.keys() {
        let name = template_name(target);
        let path = loader.find(&name).ok_or_else(|| {
            CharmError::TemplateRegister(name.clone(), "template not found".into())
        })?;

        debug!("Registering {} at path '{}'", name, path.display());
        let source = fs::read_to_string(&path)?;
        registry
            .register_template_string(&name, source)
            .map_err(|err| CharmError::TemplateRegister(name.clone(), err.to_string()))?;
    }

    let context = view.to_context();
    trace!("Template context: {}", context);

    restart_map
        .keys()
        .map(|target| -> Result<RenderedConfigFile, CharmError> {
            let name = template_name(target);
            debug!("Rendering {}", name);
            let rendered = registry
                .render(&name, &context)
                .map_err(|err| CharmError::TemplateRender(name.clone(), err.to_string()))?;

            Ok(RenderedConfigFile {
                path: target.clone(),
                rendered,
            })
        })
        .collect()
}

/// Write the files whose content changed, returning the services that need a restart
///
/// Services come back once each, in the order the restart map first names them.
pub fn write_changed(
    rendered: &[RenderedConfigFile],
    restart_map: &BTreeMap<PathBuf, Vec<String>>,
) -> Result<Vec<String>, CharmError> {
    let mut restart = vec![];

    for file in rendered {
        if file.is_current() {
            trace!("{} is unchanged", file.path.display());
            continue;
        }

        debug!("Writing {}", file.path.display());
        file.write_to_disk()?;

        for service in restart_map.get(&file.path).into_iter().flatten() {
            if !restart.contains(service) {
                restart.push(service.clone());
            }
        }
    }

    Ok(restart)
}

pub fn restart_services(services: &[String], runner: &dyn Runner) -> Result<(), CharmError> {
    for service in services {
        info!("Restarting {}", service);
        runner.run("systemctl", &args(&["restart", service.as_str()]))?;
    }
    Ok(())
}

/// Render all configuration, write what changed, and restart affected services
pub fn render_and_restart(
    loader: &TemplateLoader,
    view: &AdapterView,
    restart_map: &BTreeMap<PathBuf, Vec<String>>,
    runner: &dyn Runner,
) -> Result<Vec<String>, CharmError> {
    let rendered = render_configs(loader, view, restart_map)?;
    let restart = write_changed(&rendered, restart_map)?;
    restart_services(&restart, runner)?;

    Ok(restart)
}
