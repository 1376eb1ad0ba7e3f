use ndarray::Array1;
use vantage::agent::{DqnAgentBuilder, EpsilonSchedule, TargetUpdate};
use vantage::environment::{Environment, Step};
use vantage::error::{Result, VantageError};
use vantage::network::{Architecture, NetworkConfig};
use vantage::training::{LoopState, MemorySink, TrainingConfig, TrainingLoop, TruncationPolicy};

/// Walk right along a short corridor; reaching the end pays 1.
struct Corridor {
    length: usize,
    position: usize,
    started: bool,
}

impl Corridor {
    fn new(length: usize) -> Self {
        Corridor {
            length,
            position: 0,
            started: false,
        }
    }

    fn observation(&self) -> Array1<f32> {
        let mut observation = Array1::zeros(self.length);
        observation[self.position] = 1.0;
        observation
    }
}

impl Environment for Corridor {
    type Info = usize;

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.position = 0;
        self.started = true;
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<Step<usize>> {
        if !self.started {
            return Err(VantageError::Environment("step called before reset".to_string()));
        }
        match action {
            0 => self.position = self.position.saturating_sub(1),
            1 => self.position += 1,
            _ => return Err(VantageError::InvalidAction { action, max_actions: 2 }),
        }
        let done = self.position == self.length - 1;
        let reward = if done { 1.0 } else { 0.0 };
        Ok(Step::new(self.observation(), reward, done, self.position))
    }

    fn observation_space(&self) -> usize {
        self.length
    }

    fn action_space(&self) -> usize {
        2
    }
}

#[test]
fn test_log_file_has_one_line_per_episode() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("training_log.txt");

    let agent = DqnAgentBuilder::new()
        .network_config(NetworkConfig::new(5, 2, vec![16]).with_seed(1))
        .epsilon(EpsilonSchedule::constant(0.3))
        .seed(4)
        .build()
        .unwrap();
    let config = TrainingConfig::new(6, 20).with_log_file(&log_path);
    let mut training = TrainingLoop::new(config, agent, Corridor::new(5)).unwrap();

    let report = training.run().unwrap();
    let contents = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();

    assert_eq!(lines.len(), 6);
    for (line, summary) in lines.iter().zip(&report.episodes) {
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], summary.steps.to_string());
        assert_eq!(fields[1].parse::<f32>().unwrap(), summary.reward);
        assert_eq!(fields[2].parse::<f32>().unwrap(), summary.rolling_average);
        assert_eq!(fields[3], "Actions list:");
        assert_eq!(fields[4], format!("{:?}", summary.actions));
    }
}

#[test]
fn test_log_file_truncated_per_run() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("training_log.txt");
    std::fs::write(&log_path, "stale\nstale\nstale\nstale\n").unwrap();

    let agent = DqnAgentBuilder::new()
        .network_config(NetworkConfig::new(4, 2, vec![8]).with_seed(2))
        .build()
        .unwrap();
    let config = TrainingConfig::new(2, 10).with_log_file(&log_path);
    TrainingLoop::new(config, agent, Corridor::new(4)).unwrap().run().unwrap();

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(!contents.contains("stale"));
}

#[test]
fn test_dueling_agent_with_replay_and_hard_updates() {
    let agent = DqnAgentBuilder::new()
        .network_config(
            NetworkConfig::new(6, 2, vec![16, 16])
                .with_architecture(Architecture::Dueling)
                .with_learning_rate(1e-3)
                .with_seed(8),
        )
        .epsilon(EpsilonSchedule { start: 1.0, end: 0.05, decay: 0.99 })
        .target_update(TargetUpdate::Hard { every: 10 })
        .terminal_on_truncation(true)
        .replay(200, 8)
        .seed(8)
        .build()
        .unwrap();
    let sink = MemorySink::new();
    let config = TrainingConfig::new(10, 30)
        .with_average_reward_steps(3)
        .with_truncation_policy(TruncationPolicy::Signal);
    let mut training = TrainingLoop::builder()
        .config(config)
        .agent(agent)
        .env(Corridor::new(6))
        .sink(sink.clone())
        .build()
        .unwrap();

    let report = training.run().unwrap();

    assert_eq!(training.state(), LoopState::Finished);
    assert_eq!(sink.len(), 10);
    assert_eq!(report.history.len(), 10);
    let steps: usize = report.episodes.iter().map(|s| s.steps).sum();
    assert_eq!(report.total_steps, steps);
    assert_eq!(training.agent().learn_calls(), steps);
    for summary in &report.episodes {
        assert!(summary.steps <= 29);
        assert_eq!(summary.actions.len(), summary.steps);
        if summary.terminated {
            assert_eq!(summary.reward, 1.0);
        } else {
            assert_eq!(summary.steps, 29);
            assert_eq!(summary.reward, 0.0);
        }
    }
}

#[test]
fn test_reward_history_saved_after_run() {
    let dir = tempfile::tempdir().unwrap();
    let agent = DqnAgentBuilder::new()
        .network_config(NetworkConfig::new(4, 2, vec![8]).with_seed(5))
        .build()
        .unwrap();
    let mut training = TrainingLoop::new(TrainingConfig::new(3, 8), agent, Corridor::new(4)).unwrap();
    let report = training.run().unwrap();

    let path = dir.path().join("rewards.json");
    report.history.save_json(&path).unwrap();
    let loaded = vantage::training::RewardHistory::load_json(&path).unwrap();
    assert_eq!(loaded.rewards(), report.history.rewards());
}
