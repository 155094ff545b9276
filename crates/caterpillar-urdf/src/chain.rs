//! Built-in segment-chain robot.
//!
//! A straight chain of cylindrical segments lying along -x, head first,
//! connected by revolute joints. It stands in for a CAD export when no URDF
//! file is configured and gives tests a robot with a known joint count.

use std::fmt::Write;

use caterpillar_core::config::BodyConfig;

/// Name of segment `i` (the head is `seg_0`).
pub fn segment_name(i: usize) -> String {
    format!("seg_{i}")
}

/// Name of the joint between segment `i` and `i + 1`.
pub fn joint_name(i: usize) -> String {
    format!("joint_{i}")
}

/// Generate URDF XML for a chain described by `body`.
#[allow(clippy::cast_precision_loss)]
pub fn segment_chain_urdf(body: &BodyConfig) -> String {
    let length = body.segment_length;
    let radius = body.segment_radius;
    let mass = body.segment_mass;
    let half = length * 0.5;
    // Solid cylinder lying along x.
    let i_axial = 0.5 * mass * radius * radius;
    let i_transverse = mass * (3.0 * radius * radius + length * length) / 12.0;
    let [ax, ay, az] = body.joint_axis;
    // Collision slightly shorter than the pitch so neighbours do not touch at rest.
    let collision_length = (length - radius).max(radius);
    let limit = body.joint_limit;

    let mut xml = String::new();
    let _ = writeln!(xml, r#"<?xml version="1.0"?>"#);
    let _ = writeln!(xml, r#"<robot name="caterpillar">"#);
    for i in 0..body.segments {
        let _ = writeln!(
            xml,
            r#"  <link name="{name}">
    <inertial>
      <origin xyz="{cx} 0 0" rpy="0 0 0"/>
      <mass value="{mass}"/>
      <inertia ixx="{i_axial}" ixy="0" ixz="0" iyy="{i_transverse}" iyz="0" izz="{i_transverse}"/>
    </inertial>
    <collision>
      <origin xyz="{cx} 0 0" rpy="0 1.5707963 0"/>
      <geometry>
        <cylinder radius="{radius}" length="{collision_length}"/>
      </geometry>
    </collision>
  </link>"#,
            name = segment_name(i),
            cx = -half,
        );
    }
    for i in 0..body.segments.saturating_sub(1) {
        let _ = writeln!(
            xml,
            r#"  <joint name="{name}" type="revolute">
    <parent link="{parent}"/>
    <child link="{child}"/>
    <origin xyz="{offset} 0 0" rpy="0 0 0"/>
    <axis xyz="{ax} {ay} {az}"/>
    <limit lower="{lower}" upper="{limit}" effort="1" velocity="10"/>
  </joint>"#,
            name = joint_name(i),
            parent = segment_name(i),
            child = segment_name(i + 1),
            offset = -length,
            lower = -limit,
        );
    }
    let _ = writeln!(xml, "</robot>");
    xml
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
