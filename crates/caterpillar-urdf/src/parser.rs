//! Reading URDF text with `urdf-rs` and lowering it into a [`RobotModel`].

// urdf-rs stores f64; the simulation runs in f32.
#![allow(clippy::cast_possible_truncation)]

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::UrdfError;
use crate::types::{
    Collision, Geometry, Inertial, JointData, JointType, LinkData, Pose, RobotModel,
};

/// Read and lower a URDF file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<RobotModel, UrdfError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(|source| UrdfError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_string(&xml)
}

/// Lower URDF text already in memory.
pub fn parse_string(xml: &str) -> Result<RobotModel, UrdfError> {
    let robot = urdf_rs::read_from_string(xml).map_err(|e| UrdfError::Parse(e.to_string()))?;
    lower_robot(&robot)
}

// ---------------------------------------------------------------------------
// Lowering
// ---------------------------------------------------------------------------

fn lower_robot(robot: &urdf_rs::Robot) -> Result<RobotModel, UrdfError> {
    let links = robot
        .links
        .iter()
        .map(|link| (link.name.clone(), lower_link(link)))
        .collect::<HashMap<_, _>>();

    let mut joints = HashMap::with_capacity(robot.joints.len());
    for joint in &robot.joints {
        let lowered = lower_joint(joint)?;
        for end in [&lowered.parent, &lowered.child] {
            if !links.contains_key(end) {
                return Err(UrdfError::MissingLink(end.clone()));
            }
        }
        joints.insert(lowered.name.clone(), lowered);
    }

    // Declaration order decides between several parentless links.
    let children: HashSet<&str> = robot.joints.iter().map(|j| j.child.link.as_str()).collect();
    let root_link = robot
        .links
        .iter()
        .find(|link| !children.contains(link.name.as_str()))
        .map(|link| link.name.clone())
        .ok_or(UrdfError::NoRootLink)?;

    Ok(RobotModel {
        name: robot.name.clone(),
        links,
        joints,
        root_link,
    })
}

fn lower_link(link: &urdf_rs::Link) -> LinkData {
    let block = &link.inertial;
    let mass = block.mass.value as f32;
    let inertial = (mass > 0.0).then(|| Inertial {
        center: pose(&block.origin),
        mass,
        principal: [
            block.inertia.ixx as f32,
            block.inertia.iyy as f32,
            block.inertia.izz as f32,
        ],
    });
    let collisions = link
        .collision
        .iter()
        .map(|c| Collision {
            pose: pose(&c.origin),
            geometry: geometry(&c.geometry),
        })
        .collect();
    LinkData {
        name: link.name.clone(),
        inertial,
        collisions,
    }
}

fn lower_joint(joint: &urdf_rs::Joint) -> Result<JointData, UrdfError> {
    let joint_type = match joint.joint_type {
        urdf_rs::JointType::Revolute => JointType::Revolute,
        urdf_rs::JointType::Continuous => JointType::Continuous,
        urdf_rs::JointType::Prismatic => JointType::Prismatic,
        urdf_rs::JointType::Fixed => JointType::Fixed,
        urdf_rs::JointType::Floating => JointType::Floating,
        urdf_rs::JointType::Planar => JointType::Planar,
        urdf_rs::JointType::Spherical => {
            return Err(UrdfError::UnsupportedJointType("spherical".into()));
        }
    };
    let limit = &joint.limit;
    // A missing <limit> reads as lower == upper == 0.
    let range = ((limit.upper - limit.lower).abs() > f64::EPSILON)
        .then(|| [limit.lower as f32, limit.upper as f32]);

    Ok(JointData {
        name: joint.name.clone(),
        joint_type,
        parent: joint.parent.link.clone(),
        child: joint.child.link.clone(),
        pose: pose(&joint.origin),
        axis: narrow(&joint.axis.xyz),
        range,
        max_effort: limit.effort as f32,
        max_velocity: limit.velocity as f32,
    })
}

fn geometry(shape: &urdf_rs::Geometry) -> Geometry {
    match shape {
        urdf_rs::Geometry::Sphere { radius } => Geometry::Sphere {
            radius: *radius as f32,
        },
        urdf_rs::Geometry::Box { size } => Geometry::Box { size: narrow(size) },
        urdf_rs::Geometry::Cylinder { radius, length } => Geometry::Cylinder {
            radius: *radius as f32,
            length: *length as f32,
        },
        urdf_rs::Geometry::Capsule { radius, length } => Geometry::Capsule {
            radius: *radius as f32,
            length: *length as f32,
        },
        urdf_rs::Geometry::Mesh { filename, scale } => Geometry::Mesh {
            filename: filename.clone(),
            scale: scale.as_ref().map_or([1.0; 3], |s| narrow(s)),
        },
    }
}

fn pose(origin: &urdf_rs::Pose) -> Pose {
    Pose {
        xyz: narrow(&origin.xyz),
        rpy: narrow(&origin.rpy),
    }
}

const fn narrow(v: &[f64; 3]) -> [f32; 3] {
    [v[0] as f32, v[1] as f32, v[2] as f32]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const LONE_LINK: &str = r#"
        <robot name="pebble">
            <link name="shell"/>
        </robot>
    "#;

    const THREE_SEGMENT_URDF: &str = r#"
        <robot name="crawler">
            <link name="head">
                <inertial>
                    <mass value="0.002"/>
                    <inertia ixx="1e-7" ixy="0" ixz="0" iyy="2e-7" iyz="0" izz="2e-7"/>
                </inertial>
                <visual>
                    <geometry>
                        <mesh filename="/abs/meshes/head.stl"/>
                    </geometry>
                </visual>
                <collision>
                    <origin xyz="-0.015 0 0" rpy="0 1.5708 0"/>
                    <geometry>
                        <cylinder radius="0.008" length="0.03"/>
                    </geometry>
                </collision>
            </link>
            <link name="body"/>
            <link name="tail"/>
            <joint name="j_tail" type="revolute">
                <parent link="body"/>
                <child link="tail"/>
                <origin xyz="-0.03 0 0"/>
                <axis xyz="0 0 1"/>
                <limit lower="-1.57" upper="1.57" effort="0.0164" velocity="10"/>
            </joint>
            <joint name="j_head" type="revolute">
                <parent link="head"/>
                <child link="body"/>
                <origin xyz="-0.03 0 0"/>
                <axis xyz="0 0 1"/>
                <limit lower="-1.57" upper="1.57" effort="0.0164" velocity="10"/>
                <dynamics damping="0.5" friction="0.1"/>
            </joint>
        </robot>
    "#;

    const CONTINUOUS_URDF: &str = r#"
        <robot name="wheel">
            <link name="base"/>
            <link name="rim"/>
            <joint name="spin" type="continuous">
                <parent link="base"/>
                <child link="rim"/>
                <axis xyz="0 1 0"/>
            </joint>
        </robot>
    "#;

    #[test]
    fn lone_link_is_its_own_root() {
        let model = parse_string(LONE_LINK).unwrap();
        assert_eq!(model.name, "pebble");
        assert_eq!((model.links.len(), model.joints.len()), (1, 0));
        assert_eq!(model.root_link, "shell");
        assert_eq!(model.dof(), 0);
    }

    #[test]
    fn parse_chain_finds_head_as_root() {
        let model = parse_string(THREE_SEGMENT_URDF).unwrap();
        assert_eq!(model.root_link, "head");
        assert_eq!(model.dof(), 2);
        assert_eq!(model.actuated_joint_names(), vec!["j_head", "j_tail"]);
    }

    #[test]
    fn joint_fields_parsed() {
        let model = parse_string(THREE_SEGMENT_URDF).unwrap();
        let joint = model.joint("j_head").unwrap();
        assert_eq!(joint.joint_type, JointType::Revolute);
        assert_eq!(joint.parent, "head");
        assert_eq!(joint.child, "body");
        assert!((joint.pose.xyz[0] + 0.03).abs() < 1e-6);
        assert_eq!(joint.axis, [0.0, 0.0, 1.0]);
        let [lower, upper] = joint.range.unwrap();
        assert!((lower + 1.57).abs() < 1e-6 && (upper - 1.57).abs() < 1e-6);
        assert!((joint.max_effort - 0.0164).abs() < 1e-7);
    }

    #[test]
    fn continuous_joint_has_no_range() {
        let model = parse_string(CONTINUOUS_URDF).unwrap();
        let joint = model.joint("spin").unwrap();
        assert_eq!(joint.joint_type, JointType::Continuous);
        assert_eq!(joint.range, None);
    }

    #[test]
    fn link_inertial_and_collision_parsed() {
        let model = parse_string(THREE_SEGMENT_URDF).unwrap();
        let head = model.link("head").unwrap();
        let inertial = head.inertial.as_ref().unwrap();
        assert!((inertial.mass - 0.002).abs() < 1e-7);
        assert!((inertial.principal[1] - 2e-7).abs() < 1e-12);
        assert_eq!(head.collisions.len(), 1);
        assert_eq!(
            head.collisions[0].geometry,
            Geometry::Cylinder {
                radius: 0.008,
                length: 0.03
            }
        );
        assert!((head.collisions[0].pose.rpy[1] - 1.5708).abs() < 1e-6);
    }

    #[test]
    fn massless_link_has_no_inertial() {
        let model = parse_string(THREE_SEGMENT_URDF).unwrap();
        assert!(model.link("tail").unwrap().inertial.is_none());
    }

    #[test]
    fn truncated_xml_is_parse_error() {
        assert!(matches!(parse_string("<robot name="), Err(UrdfError::Parse(_))));
    }

    #[test]
    fn joint_to_unknown_link_is_rejected() {
        let xml = r#"
            <robot name="broken">
                <link name="base"/>
                <joint name="j" type="fixed">
                    <parent link="base"/>
                    <child link="ghost"/>
                </joint>
            </robot>
        "#;
        assert!(matches!(
            parse_string(xml),
            Err(UrdfError::MissingLink(name)) if name == "ghost"
        ));
    }

    #[test]
    fn unreadable_file_reports_its_path() {
        let result = parse_file("/nonexistent/caterpillar.urdf");
        assert!(matches!(
            result,
            Err(UrdfError::Io { path, .. }) if path.ends_with("caterpillar.urdf")
        ));
    }
}
