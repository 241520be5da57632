use meeg_study::config::{
    presets, BemMriImages, Contrast, OnError, ProjCounts, Reject, SensorType, SpatialFilter, StudyConfig,
};
use meeg_study::fiff::ChannelType;
use std::path::Path;

fn base_yaml() -> String {
    presets::PRESETS[0].1.to_string()
}

#[test]
fn ds000248_matches_study_record() {
    let cfg = presets::ds000248().unwrap();
    assert_eq!(cfg.study_name, "ds000248");
    assert_eq!(cfg.bids_root, Path::new("./ds000248"));
    assert_eq!(cfg.subjects_dir, Path::new("./ds000248/derivatives/freesurfer/subjects"));
    assert_eq!(cfg.subjects, vec!["01"]);
    assert_eq!(cfg.conditions, vec!["Auditory", "Visual", "Auditory/Left", "Auditory/Right"]);
    assert_eq!(
        cfg.contrasts,
        vec![Contrast::new("Visual", "Auditory"), Contrast::new("Auditory/Right", "Auditory/Left")]
    );
    assert_eq!(cfg.decode, Some(false));
    assert_eq!(cfg.ch_types, vec![SensorType::Meg]);

    let reject = cfg.reject.as_ref().unwrap();
    approx::assert_relative_eq!(reject.threshold(ChannelType::Grad).unwrap(), 4000e-13);
    approx::assert_relative_eq!(reject.threshold(ChannelType::Mag).unwrap(), 4e-12);
    approx::assert_relative_eq!(reject.threshold(ChannelType::Eog).unwrap(), 150e-6);

    assert_eq!(cfg.spatial_filter, Some(SpatialFilter::Ssp));
    assert_eq!(cfg.n_proj_eog, Some(ProjCounts { n_mag: 1, n_grad: 1, n_eeg: 1 }));
    assert_eq!(cfg.n_proj_ecg, Some(ProjCounts { n_mag: 1, n_grad: 1, n_eeg: 0 }));
    assert_eq!(cfg.ecg_proj_from_average, Some(true));
    assert_eq!(cfg.eog_proj_from_average, Some(false));
    assert_eq!(cfg.bem_mri_images, Some(BemMriImages::Flash));
    assert_eq!(cfg.recreate_bem, Some(false));
    assert_eq!(cfg.recreate_scalp_surface, Some(false));
    assert_eq!(cfg.on_error, Some(OnError::Debug));
}

#[test]
fn maxwell_variant() {
    let cfg = presets::ds000248_maxwell().unwrap();
    assert_eq!(cfg.mf_reference_run.as_deref(), Some("01"));
    assert_eq!(cfg.find_flat_channels_meg, Some(true));
    assert_eq!(cfg.find_noisy_channels_meg, Some(true));
    assert_eq!(cfg.time_frequency_conditions, Some(vec!["Auditory".to_string(), "Visual".to_string()]));
    assert_eq!(cfg.canonical_event("Smiley"), "Emoji");
    assert_eq!(cfg.conditions_for_event("Auditory/Left"), vec!["Auditory", "Auditory/Left"]);
}

#[test]
fn contrasts_refer_to_conditions() {
    for (name, cfg) in presets::all().unwrap() {
        for c in &cfg.contrasts {
            assert!(cfg.conditions.contains(&c.0), "{name}: {}", c.0);
            assert!(cfg.conditions.contains(&c.1), "{name}: {}", c.1);
        }
    }
}

#[test]
fn unknown_key_is_rejected() {
    let text = format!("{}\nreject_tmax: 0.5\n", base_yaml());
    let e = StudyConfig::from_yaml_str(&text).unwrap_err();
    assert!(format!("{e:#}").contains("reject_tmax"), "{e:#}");
}

#[test]
fn missing_required_key_is_rejected() {
    let text = base_yaml().replace("study_name: ds000248\n", "");
    assert!(StudyConfig::from_yaml_str(&text).is_err());
}

#[test]
fn reject_policy_replaces_thresholds() {
    let text = base_yaml()
        .replace("reject:\n  grad: 4000.0e-13\n  mag: 4.0e-12\n  eog: 150.0e-6\n", "reject: autoreject_global\n");
    let cfg = StudyConfig::from_yaml_str(&text).unwrap();
    assert!(matches!(cfg.reject, Some(Reject::Policy(_))));
    assert_eq!(cfg.reject.unwrap().threshold(ChannelType::Mag), None);
}

#[test]
fn emptyroom_noise_needs_empty_room_processing() {
    let text = base_yaml().replace("process_er: true", "process_er: false");
    let e = StudyConfig::from_yaml_str(&text).unwrap_err();
    assert!(format!("{e:#}").contains("process_er"), "{e:#}");
}

#[test]
fn unknown_condition_in_contrast_fails() {
    let text = base_yaml().replace("[Visual, Auditory]", "[Visual, Somatosensory]");
    assert!(StudyConfig::from_yaml_str(&text).is_err());
}

#[test]
fn yaml_roundtrip_keeps_key_set() {
    let cfg = presets::ds000248_maxwell().unwrap();
    let again = StudyConfig::from_yaml_str(&cfg.to_yaml().unwrap()).unwrap();
    assert_eq!(again, cfg);
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, base_yaml()).unwrap();
    assert_eq!(StudyConfig::from_yaml_file(&path).unwrap(), presets::ds000248().unwrap());
    assert!(StudyConfig::from_yaml_file(dir.path().join("missing.yaml")).is_err());
}
