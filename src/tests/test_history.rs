use crate::error::VantageError;
use crate::training::{RewardHistory, TrainingConfig};

#[test]
fn test_average_divides_by_capacity_until_full() {
    let mut history = RewardHistory::new(3).unwrap();

    let averages: Vec<f32> = [10.0, 20.0, 30.0, 40.0]
        .iter()
        .map(|&reward| history.push(reward))
        .collect();

    let expected = [10.0 / 3.0, 30.0 / 3.0, 60.0 / 3.0, 90.0 / 3.0];
    for (average, expected) in averages.iter().zip(expected.iter()) {
        assert!((average - expected).abs() < 1e-5);
    }
    assert_eq!(history.window().collect::<Vec<_>>(), vec![20.0, 30.0, 40.0]);
    assert_eq!(history.rewards(), &[10.0, 20.0, 30.0, 40.0]);
}

#[test]
fn test_window_never_exceeds_capacity() {
    let mut history = RewardHistory::new(4).unwrap();
    for i in 0..20 {
        history.push(i as f32);
        assert!(history.window_len() <= history.capacity());
    }
    assert_eq!(history.window().next(), Some(16.0));
    assert_eq!(history.len(), 20);
}

#[test]
fn test_capacity_of_one_rejected() {
    assert!(matches!(RewardHistory::new(1), Err(VantageError::InvalidParameter { .. })));
    assert!(RewardHistory::new(0).is_err());
}

#[test]
fn test_empty_history() {
    let history = RewardHistory::new(5).unwrap();
    assert!(history.is_empty());
    assert_eq!(history.rolling_average(), 0.0);
}

#[test]
fn test_save_and_load_json() {
    let mut history = RewardHistory::new(2).unwrap();
    history.push(1.5);
    history.push(-3.0);
    history.push(7.0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rewards.json");
    history.save_json(&path).unwrap();

    let loaded = RewardHistory::load_json(&path).unwrap();
    assert_eq!(loaded, history);
}

#[test]
fn test_training_config_from_json_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("training.json");
    std::fs::write(&path, r#"{"num_episodes": 10, "episode_length": 200, "truncation_policy": "signal"}"#).unwrap();

    let config = TrainingConfig::from_json_file(&path).unwrap();
    assert_eq!(config.average_reward_steps, 5);
    assert_eq!(config.log_file, None);
    assert!(!config.verbose);
    assert_eq!(config.truncation_policy, crate::training::TruncationPolicy::Signal);
}

#[test]
fn test_training_config_from_json_validates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("training.json");
    std::fs::write(&path, r#"{"num_episodes": 10, "episode_length": 200, "average_reward_steps": 1}"#).unwrap();

    assert!(matches!(
        TrainingConfig::from_json_file(&path),
        Err(VantageError::InvalidParameter { .. })
    ));
}

#[test]
fn test_text_log_is_opt_in() {
    use crate::training::DEFAULT_LOG_FILE;

    assert_eq!(TrainingConfig::new(3, 10).log_file, None);
    let config = TrainingConfig::new(3, 10).with_default_log_file();
    assert_eq!(config.log_file, Some(std::path::PathBuf::from(DEFAULT_LOG_FILE)));
    assert_eq!(DEFAULT_LOG_FILE, "training_log.txt");
}
