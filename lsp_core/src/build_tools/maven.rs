use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::build_tools::{BuildTool, BuildToolHandler};

pub struct MavenHandler;

impl BuildToolHandler for MavenHandler {
    fn is_project(&self, root: &Path) -> bool {
        root.join("pom.xml").exists()
    }

    fn get_dependency_paths(&self, root: &Path) -> Result<Vec<(Option<PathBuf>, Option<PathBuf>)>> {
        let pom_path = root.join("pom.xml");
        let content = std::fs::read_to_string(&pom_path)
            .with_context(|| format!("failed to read {}", pom_path.display()))?;

        let deps = parse_pom_dependencies(&content)?;
        let repo = local_repository_root();

        Ok(deps
            .into_iter()
            .filter(|dep| matches!(dep.scope.as_deref(), None | Some("compile" | "runtime" | "provided")))
            .filter_map(|dep| {
                let version = dep.version.as_ref()?;
                let artifact_dir = repo
                    .join(dep.group_id.replace('.', "/"))
                    .join(&dep.artifact_id)
                    .join(version);

                let jar = artifact_dir.join(format!("{}-{}.jar", dep.artifact_id, version));
                if !jar.exists() {
                    return None;
                }

                let sources = artifact_dir.join(format!("{}-{}-sources.jar", dep.artifact_id, version));
                let sources = sources.exists().then_some(sources);

                Some((Some(jar), sources))
            })
            .collect())
    }

    fn get_jdk_dependency_path(&self, _root: &Path) -> Result<Option<PathBuf>> {
        let Some(java_home) = std::env::var_os("JAVA_HOME") else {
            return Ok(None);
        };
        let java_home = PathBuf::from(java_home);

        let lib_src_zip = java_home.join("lib").join("src.zip");
        if lib_src_zip.exists() {
            return Ok(Some(lib_src_zip));
        }

        let src_zip = java_home.join("src.zip");
        Ok(src_zip.exists().then_some(src_zip))
    }

    fn get_build_system(&self) -> BuildTool {
        BuildTool::Maven
    }
}

fn local_repository_root() -> PathBuf {
    std::env::var_os("M2_REPO")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".m2").join("repository")))
        .unwrap_or_else(|| PathBuf::from(".m2/repository"))
}

struct MavenDependency {
    group_id: String,
    artifact_id: String,
    version: Option<String>,
    scope: Option<String>,
}

#[derive(Default)]
struct DepAccum {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    scope: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseContext {
    Root,
    Properties,
    Dependencies,
    Dependency,
}

/// SAX-style pass over a pom.xml, collecting direct `<dependency>` entries.
/// Property placeholders (`${...}`) in `<version>` are resolved against
/// `<properties>` declared in the same file; parent-POM inheritance and
/// remote property resolution are intentionally out of scope.
fn parse_pom_dependencies(content: &str) -> Result<Vec<MavenDependency>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut properties: HashMap<String, String> = HashMap::new();
    let mut dependencies = Vec::new();

    let mut context_stack = vec![ParseContext::Root];
    let mut current_dep: Option<DepAccum> = None;
    let mut current_tag: Option<String> = None;
    let mut current_prop_key: Option<String> = None;

    loop {
        let event = reader
            .read_event()
            .context("failed to parse pom.xml")?;

        match event {
            Event::Start(ref e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                let ctx = *context_stack.last().unwrap_or(&ParseContext::Root);

                match (ctx, tag.as_str()) {
                    (ParseContext::Root, "dependencies") => {
                        context_stack.push(ParseContext::Dependencies);
                    }
                    (ParseContext::Root, "properties") => {
                        context_stack.push(ParseContext::Properties);
                    }
                    (ParseContext::Properties, key) => {
                        current_prop_key = Some(key.to_string());
                    }
                    (ParseContext::Dependencies, "dependency") => {
                        context_stack.push(ParseContext::Dependency);
                        current_dep = Some(DepAccum::default());
                        current_tag = None;
                    }
                    (ParseContext::Dependency, field) => {
                        current_tag = Some(field.to_string());
                    }
                    _ => {}
                }
            }
            Event::Text(ref e) => {
                let text = match e.decode() {
                    Ok(cow) => cow.trim().to_string(),
                    Err(_) => String::from_utf8_lossy(e.as_ref()).trim().to_string(),
                };
                let ctx = *context_stack.last().unwrap_or(&ParseContext::Root);

                if ctx == ParseContext::Dependency {
                    if let (Some(tag), Some(dep)) = (current_tag.as_deref(), current_dep.as_mut()) {
                        match tag {
                            "groupId" => dep.group_id = Some(text),
                            "artifactId" => dep.artifact_id = Some(text),
                            "version" => dep.version = Some(text),
                            "scope" => dep.scope = Some(text),
                            _ => {}
                        }
                    }
                } else if ctx == ParseContext::Properties {
                    if let Some(key) = current_prop_key.take() {
                        properties.insert(key, text);
                    }
                }
            }
            Event::End(ref e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                let ctx = *context_stack.last().unwrap_or(&ParseContext::Root);

                match (ctx, tag.as_str()) {
                    (ParseContext::Dependency, "dependency") => {
                        context_stack.pop();
                        current_tag = None;
                        if let Some(dep) = current_dep.take() {
                            if let Some(maven_dep) = finalize_dep(dep, &properties) {
                                dependencies.push(maven_dep);
                            }
                        }
                    }
                    (ParseContext::Dependencies, "dependencies")
                    | (ParseContext::Properties, "properties") => {
                        context_stack.pop();
                    }
                    (ParseContext::Dependency, _) => {
                        current_tag = None;
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(dependencies)
}

fn finalize_dep(dep: DepAccum, properties: &HashMap<String, String>) -> Option<MavenDependency> {
    let group_id = resolve_property(&dep.group_id?, properties);
    let artifact_id = resolve_property(&dep.artifact_id?, properties);
    let version = dep.version.map(|v| resolve_property(&v, properties));

    Some(MavenDependency {
        group_id,
        artifact_id,
        version,
        scope: dep.scope,
    })
}

fn resolve_property(raw: &str, properties: &HashMap<String, String>) -> String {
    if let Some(key) = raw.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        if let Some(value) = properties.get(key) {
            return value.clone();
        }
    }
    raw.to_string()
}
