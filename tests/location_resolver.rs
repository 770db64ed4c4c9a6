use logoplace::{
    Anchor, Joint, KeypointSet, LocationResolver, Point, ResolutionMode, SidecarKeypoints,
    placement::VOCABULARY, resolve_location,
};

fn shoulders(cx: f32, cy: f32, span: f32) -> KeypointSet {
    KeypointSet::new()
        .with(Joint::LeftShoulder, Point::new(cx - span / 2.0, cy))
        .with(Joint::RightShoulder, Point::new(cx + span / 2.0, cy))
}

#[test]
fn left_chest_from_shoulders() {
    let kp = shoulders(600.0, 500.0, 400.0);
    assert_eq!(
        resolve_location("LEFT-CHEST", Some(&kp), 1200, 1800),
        Anchor::new(528, 588)
    );
}

#[test]
fn unknown_label_uses_default_regardless_of_keypoints() {
    let kp = shoulders(600.0, 500.0, 400.0);
    for (w, h) in [(1200u32, 1800u32), (999, 333), (7, 5)] {
        let expected = Anchor::new(i64::from(w / 2), i64::from(h / 3));
        assert_eq!(resolve_location("UNKNOWN-ZONE-XYZ", Some(&kp), w, h), expected);
        assert_eq!(resolve_location("UNKNOWN-ZONE-XYZ", None, w, h), expected);
    }
}

#[test]
fn every_label_stays_inside_the_photo_with_wild_keypoints() {
    let mut kp = KeypointSet::new();
    for (i, j) in Joint::ALL.iter().enumerate() {
        let sign = if i % 2 == 0 { -1.0 } else { 1.0 };
        kp.insert(*j, Point::new(sign * 5000.0, -sign * 7000.0 + i as f32));
    }
    let resolver = LocationResolver::default();
    for e in VOCABULARY {
        let r = resolver.resolve(e.label, Some(&kp), 640, 480);
        assert!((0..640).contains(&r.anchor.x), "{}: {:?}", e.label, r.anchor);
        assert!((0..480).contains(&r.anchor.y), "{}: {:?}", e.label, r.anchor);
        assert_eq!(r.zone, Some(e.label));
    }
}

#[test]
fn compound_labels_place_at_first_zone() {
    let kp = shoulders(600.0, 500.0, 400.0);
    let compound = resolve_location("LEFT-CHEST-RIGHT-SLEEVE", Some(&kp), 1200, 1800);
    let single = resolve_location("LEFT-CHEST", Some(&kp), 1200, 1800);
    assert_eq!(compound, single);
}

#[test]
fn labels_are_matched_loosely() {
    let kp = shoulders(600.0, 500.0, 400.0);
    let r = LocationResolver::default().resolve("  left-chest ", Some(&kp), 1200, 1800);
    assert_eq!(r.mode, ResolutionMode::Geometric);
    assert_eq!(r.zone, Some("LEFT-CHEST"));
}

#[test]
fn sleeve_without_arm_joints_uses_heuristic_side() {
    let kp = shoulders(600.0, 500.0, 400.0);
    let r = LocationResolver::default().resolve("LEFT-SLEEVE", Some(&kp), 1200, 1800);
    assert_eq!(r.mode, ResolutionMode::Heuristic);
    assert_eq!(r.anchor, Anchor::new(150, 600));
}

#[test]
fn normalized_sidecar_drives_placement() {
    let mut pts = vec![[0.0f32, 0.0]; 33];
    pts[Joint::LeftShoulder.index()] = [0.25, 0.25];
    pts[Joint::RightShoulder.index()] = [0.75, 0.25];
    let json = serde_json::json!({ "normalized": pts }).to_string();

    let kp = SidecarKeypoints::parse(&json, 800, 2000).unwrap().unwrap();
    assert_eq!(kp.len(), 33);
    // span 400 centered at (400, 500)
    assert_eq!(
        resolve_location("FULL-FRONT", Some(&kp), 800, 2000),
        Anchor::new(400, 588)
    );
}
