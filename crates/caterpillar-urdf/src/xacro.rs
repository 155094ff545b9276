//! Path rewriting for xacro-exported robot descriptions.
//!
//! CAD exporters emit `.xacro` files that reference meshes through ROS
//! package URLs (`package://<pkg>/meshes/...`, `file://$(find <pkg>)/...`)
//! and pull in macro files with `<xacro:include>`. Physics loaders outside
//! ROS resolve neither, so the converter strips the xacro directives and
//! rewrites package references to the absolute description root.

use std::path::{Path, PathBuf};

use regex::{NoExpand, Regex};
use tracing::{info, warn};

use crate::error::UrdfError;

// ---------------------------------------------------------------------------
// XacroRewriter
// ---------------------------------------------------------------------------

/// Compiled rewrite rules. The transform is pure and idempotent.
pub struct XacroRewriter {
    include: Regex,
    namespace: Regex,
    package_url: Regex,
    find_url: Regex,
    blank_lines: Regex,
}

impl XacroRewriter {
    pub fn new() -> Result<Self, UrdfError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| UrdfError::Conversion(e.to_string()))
        };
        Ok(Self {
            include: compile(r"<xacro:include.*?>")?,
            namespace: compile(r#"\sxmlns:xacro=".*?""#)?,
            package_url: compile(r"package://[^/]+/")?,
            find_url: compile(r"file://\$\(find [^)]+\)/")?,
            blank_lines: compile(r"\n\s*\n")?,
        })
    }

    /// Rewrite one description document against `project_root`.
    pub fn rewrite(&self, content: &str, project_root: &Path) -> String {
        let root = format!("{}/", project_root.display());
        let file_root = format!("file://{root}");

        let content = self.include.replace_all(content, "");
        let content = self.namespace.replace_all(&content, "");
        let content = self.package_url.replace_all(&content, NoExpand(&root));
        let content = self.find_url.replace_all(&content, NoExpand(&file_root));
        let content = self.blank_lines.replace_all(&content, "\n");
        content.into_owned()
    }
}

// ---------------------------------------------------------------------------
// File conversion
// ---------------------------------------------------------------------------

/// Description package root for a source file: the parent of the directory
/// holding it (`<root>/urdf/robot.xacro` gives `<root>`).
pub fn project_root_for(source: &Path) -> Result<PathBuf, UrdfError> {
    let absolute = std::path::absolute(source).map_err(|e| UrdfError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;
    absolute
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            UrdfError::Conversion(format!(
                "{} has no enclosing package directory",
                absolute.display()
            ))
        })
}

/// Convert `source` and write the result as `output_name` next to it.
///
/// Returns the written path. A missing source yields
/// [`UrdfError::SourceNotFound`] and writes nothing.
pub fn convert_file(source: &Path, output_name: &str) -> Result<PathBuf, UrdfError> {
    let content = match std::fs::read_to_string(source) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %source.display(), "xacro source not found");
            return Err(UrdfError::SourceNotFound(source.to_path_buf()));
        }
        Err(e) => {
            return Err(UrdfError::Io {
                path: source.to_path_buf(),
                source: e,
            });
        }
    };
    info!(path = %source.display(), "read xacro source");

    let project_root = project_root_for(source)?;
    let rewritten = XacroRewriter::new()?.rewrite(&content, &project_root);

    let output = source
        .parent()
        .map_or_else(|| PathBuf::from(output_name), |dir| dir.join(output_name));
    std::fs::write(&output, rewritten).map_err(|e| UrdfError::Io {
        path: output.clone(),
        source: e,
    })?;
    info!(path = %output.display(), root = %project_root.display(), "wrote converted URDF");
    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORTED: &str = r#"<?xml version="1.0" ?>
<robot name="Capsule_robot" xmlns:xacro="http://www.ros.org/wiki/xacro">

<xacro:include filename="$(find Capsule_robot_description)/urdf/materials.xacro" />
<xacro:include filename="$(find Capsule_robot_description)/urdf/Capsule_robot.trans" />


<link name="base_link">
  <visual>
    <geometry>
      <mesh filename="package://Capsule_robot_description/meshes/base_link.stl" scale="0.001 0.001 0.001"/>
    </geometry>
  </visual>
  <collision>
    <geometry>
      <mesh filename="file://$(find Capsule_robot_description)/meshes/base_link.stl"/>
    </geometry>
  </collision>
</link>
   
</robot>
"#;

    fn rewrite(content: &str) -> String {
        XacroRewriter::new()
            .unwrap()
            .rewrite(content, Path::new("/work/Capsule_robot_description"))
    }

    #[test]
    fn strips_includes_and_namespace() {
        let out = rewrite(EXPORTED);
        assert!(!out.contains("xacro:include"));
        assert!(!out.contains("xmlns:xacro"));
        assert!(out.contains(r#"<robot name="Capsule_robot">"#));
    }

    #[test]
    fn rewrites_package_urls() {
        let out = rewrite(EXPORTED);
        assert!(!out.contains("package://"));
        assert!(out.contains(
            r#"filename="/work/Capsule_robot_description/meshes/base_link.stl" scale"#
        ));
    }

    #[test]
    fn rewrites_find_urls() {
        let out = rewrite(EXPORTED);
        assert!(!out.contains("$(find"));
        assert!(out.contains(
            r#"filename="file:///work/Capsule_robot_description/meshes/base_link.stl""#
        ));
    }

    #[test]
    fn collapses_blank_lines() {
        let out = rewrite(EXPORTED);
        assert!(!out.contains("\n\n"));
        assert!(!out.contains("\n   \n"));
        assert!(out.contains("</link>\n</robot>"));
    }

    #[test]
    fn rewrite_is_idempotent() {
        let once = rewrite(EXPORTED);
        let twice = rewrite(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn replacement_root_is_taken_literally() {
        let out = XacroRewriter::new().unwrap().rewrite(
            r#"<mesh filename="package://pkg/a.stl"/>"#,
            Path::new("/opt/$HOME/pkg"),
        );
        assert_eq!(out, r#"<mesh filename="/opt/$HOME/pkg/a.stl"/>"#);
    }

    #[test]
    fn untouched_content_passes_through() {
        let plain = "<robot name=\"r\">\n  <link name=\"a\"/>\n</robot>\n";
        assert_eq!(rewrite(plain), plain);
    }

    #[test]
    fn project_root_is_grandparent() {
        let root = project_root_for(Path::new("/work/pkg/urdf/robot.xacro")).unwrap();
        assert_eq!(root, PathBuf::from("/work/pkg"));
    }

    #[test]
    fn missing_source_is_reported() {
        let source = std::env::temp_dir()
            .join("caterpillar_xacro_missing")
            .join("urdf")
            .join("absent.xacro");
        let result = convert_file(&source, "absent.urdf");
        assert!(matches!(result, Err(UrdfError::SourceNotFound(path)) if path == source));
    }

    #[test]
    fn convert_file_writes_next_to_source_and_is_stable() {
        let root = std::env::temp_dir().join(format!(
            "caterpillar_xacro_convert_{}",
            std::process::id()
        ));
        let urdf_dir = root.join("urdf");
        std::fs::create_dir_all(&urdf_dir).unwrap();
        let source = urdf_dir.join("robot.xacro");
        std::fs::write(&source, EXPORTED).unwrap();

        let output = convert_file(&source, "robot.urdf").unwrap();
        assert_eq!(output, urdf_dir.join("robot.urdf"));
        let first = std::fs::read_to_string(&output).unwrap();
        assert!(first.contains(&format!("{}/meshes/base_link.stl", root.display())));

        // Converting the output again must not change it.
        let again = convert_file(&output, "robot.urdf").unwrap();
        let second = std::fs::read_to_string(&again).unwrap();
        assert_eq!(first, second);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
