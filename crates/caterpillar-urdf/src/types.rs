//! Robot model handed to the physics scene.
//!
//! Nothing here knows about XML. A [`RobotModel`] holds the kinematic tree
//! plus the per-link mass and contact shapes; visuals are dropped at parse
//! time.

use std::collections::{HashMap, VecDeque};

use crate::error::UrdfError;

// ---------------------------------------------------------------------------
// JointType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    /// Hinge with a position range.
    Revolute,
    /// Hinge without a position range.
    Continuous,
    /// Slider along the axis.
    Prismatic,
    /// Rigid weld.
    Fixed,
    Floating,
    Planar,
}

impl JointType {
    /// Hinges and sliders; the only joints a motor can drive.
    pub const fn is_actuated(self) -> bool {
        matches!(self, Self::Revolute | Self::Continuous | Self::Prismatic)
    }
}

// ---------------------------------------------------------------------------
// Pose / Inertial / Geometry
// ---------------------------------------------------------------------------

/// Offset of a child frame: translation in meters, then fixed-axis
/// roll/pitch/yaw in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub xyz: [f32; 3],
    pub rpy: [f32; 3],
}

/// Mass block of a link. Products of inertia are dropped.
#[derive(Debug, Clone, Default)]
pub struct Inertial {
    /// Center of mass in the link frame.
    pub center: Pose,
    pub mass: f32,
    /// `[ixx, iyy, izz]`.
    pub principal: [f32; 3],
}

/// Contact shape. Cylinders and capsules are aligned with local z.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Sphere { radius: f32 },
    Box { size: [f32; 3] },
    Cylinder { radius: f32, length: f32 },
    Capsule { radius: f32, length: f32 },
    Mesh { filename: String, scale: [f32; 3] },
}

#[derive(Debug, Clone)]
pub struct Collision {
    pub pose: Pose,
    pub geometry: Geometry,
}

// ---------------------------------------------------------------------------
// LinkData / JointData
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LinkData {
    pub name: String,
    /// `None` when the file declares no mass, or a zero mass.
    pub inertial: Option<Inertial>,
    pub collisions: Vec<Collision>,
}

impl LinkData {
    /// A bare link: no mass block, no contact shapes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inertial: None,
            collisions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JointData {
    pub name: String,
    pub joint_type: JointType,
    pub parent: String,
    pub child: String,
    /// Where the child frame sits in the parent frame.
    pub pose: Pose,
    pub axis: [f32; 3],
    /// Position range `[lower, upper]`, absent for unbounded joints.
    pub range: Option<[f32; 2]>,
    pub max_effort: f32,
    pub max_velocity: f32,
}

// ---------------------------------------------------------------------------
// RobotModel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RobotModel {
    pub name: String,
    pub links: HashMap<String, LinkData>,
    pub joints: HashMap<String, JointData>,
    /// The one link that is nobody's child.
    pub root_link: String,
}

impl RobotModel {
    pub fn link(&self, name: &str) -> Result<&LinkData, UrdfError> {
        self.links
            .get(name)
            .ok_or_else(|| UrdfError::MissingLink(name.to_owned()))
    }

    pub fn joint(&self, name: &str) -> Result<&JointData, UrdfError> {
        self.joints
            .get(name)
            .ok_or_else(|| UrdfError::MissingJoint(name.to_owned()))
    }

    /// Count of motor-driven joints.
    pub fn dof(&self) -> usize {
        self.joints
            .values()
            .filter(|j| j.joint_type.is_actuated())
            .count()
    }

    /// Joints hanging off `link`, sorted by name.
    pub fn child_joints(&self, link: &str) -> Vec<&JointData> {
        let mut children: Vec<&JointData> =
            self.joints.values().filter(|j| j.parent == link).collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        children
    }

    /// Every joint, walking outwards from the root one level at a time.
    ///
    /// Siblings are visited by name, so the order is stable across parses.
    pub fn joints_breadth_first(&self) -> Vec<&JointData> {
        let mut order = Vec::with_capacity(self.joints.len());
        let mut queue = VecDeque::from([self.root_link.as_str()]);
        while let Some(link) = queue.pop_front() {
            for joint in self.child_joints(link) {
                queue.push_back(joint.child.as_str());
                order.push(joint);
            }
        }
        order
    }

    /// Actuated joints ordered head to tail.
    ///
    /// The position in this list is the joint index used by the gait and by
    /// the action and observation vectors.
    pub fn actuated_chain(&self) -> Vec<&JointData> {
        self.joints_breadth_first()
            .into_iter()
            .filter(|j| j.joint_type.is_actuated())
            .collect()
    }

    pub fn actuated_joint_names(&self) -> Vec<&str> {
        self.actuated_chain()
            .into_iter()
            .map(|j| j.name.as_str())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn hinge(name: &str, joint_type: JointType, parent: &str, child: &str) -> JointData {
        JointData {
            name: name.into(),
            joint_type,
            parent: parent.into(),
            child: child.into(),
            pose: Pose::default(),
            axis: [0.0, 0.0, 1.0],
            range: None,
            max_effort: 1.0,
            max_velocity: 10.0,
        }
    }

    /// head -> mid -> tail, with a fixed sensor pod hanging off head.
    fn pod_robot() -> RobotModel {
        let links = ["head", "mid", "tail", "pod"]
            .into_iter()
            .map(|name| (name.to_owned(), LinkData::new(name)))
            .collect();
        let joints = [
            hinge("z_neck", JointType::Revolute, "head", "mid"),
            hinge("a_pod", JointType::Fixed, "head", "pod"),
            hinge("b_waist", JointType::Revolute, "mid", "tail"),
        ]
        .into_iter()
        .map(|j| (j.name.clone(), j))
        .collect();

        RobotModel {
            name: "pod_robot".into(),
            links,
            joints,
            root_link: "head".into(),
        }
    }

    #[test]
    fn only_hinges_and_sliders_are_driven() {
        let driven: Vec<JointType> = [
            JointType::Revolute,
            JointType::Continuous,
            JointType::Prismatic,
            JointType::Fixed,
            JointType::Floating,
            JointType::Planar,
        ]
        .into_iter()
        .filter(|t| t.is_actuated())
        .collect();
        assert_eq!(
            driven,
            [JointType::Revolute, JointType::Continuous, JointType::Prismatic]
        );
    }

    #[test]
    fn lookups_name_the_missing_element() {
        let robot = pod_robot();
        assert_eq!(robot.link("mid").unwrap().name, "mid");
        assert!(matches!(robot.link("fin"), Err(UrdfError::MissingLink(n)) if n == "fin"));
        assert_eq!(robot.joint("b_waist").unwrap().child, "tail");
        assert!(matches!(robot.joint("hip"), Err(UrdfError::MissingJoint(n)) if n == "hip"));
    }

    #[test]
    fn fixed_pod_adds_no_dof() {
        assert_eq!(pod_robot().dof(), 2);
    }

    #[test]
    fn breadth_first_visits_siblings_by_name() {
        let robot = pod_robot();
        let names: Vec<&str> = robot
            .joints_breadth_first()
            .iter()
            .map(|j| j.name.as_str())
            .collect();
        assert_eq!(names, ["a_pod", "z_neck", "b_waist"]);
    }

    #[test]
    fn actuated_chain_follows_tree_not_alphabet() {
        assert_eq!(pod_robot().actuated_joint_names(), ["z_neck", "b_waist"]);
    }

    #[test]
    fn bare_link_has_no_mass_or_shapes() {
        let link = LinkData::new("seg_0");
        assert_eq!(link.name, "seg_0");
        assert!(link.inertial.is_none() && link.collisions.is_empty());
    }
}
