//! `progress` command: five progress bar styles

use anyhow::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rand::Rng;
use std::time::Duration;

pub const MIN_COUNT: u64 = 1;
pub const MAX_COUNT: u64 = 100_000;
pub const DEFAULT_COUNT: u64 = 8000;

/// Upper bound of the per-item delay, in seconds
const ITEM_DELAY_SECS: f64 = 0.002;

/// Step sizes of the slowing bar: `exp(x / 20) - 1` for x in 0..20.
pub fn slowing_steps() -> Vec<f64> {
    (0..20).map(|x| (x as f64 / 20.0).exp() - 1.0).collect()
}

/// Keep roughly 70% of the items.
pub fn committed_items(count: u64, rng: &mut impl Rng) -> Vec<u64> {
    (0..count).filter(|_| rng.gen::<f64>() > 0.3).collect()
}

/// Progress bar demo settings
#[derive(Debug, Clone)]
pub struct ProgressDemo {
    pub count: u64,
    /// Multiplier applied to every sleep; 0 runs instantly
    pub time_scale: f64,
    /// Draw nothing
    pub hidden: bool,
}

impl ProgressDemo {
    pub fn new(count: u64) -> Result<Self> {
        if !(MIN_COUNT..=MAX_COUNT).contains(&count) {
            return Err(anyhow::anyhow!(
                "count must be between {} and {}",
                MIN_COUNT,
                MAX_COUNT
            ));
        }
        Ok(Self {
            count,
            time_scale: 1.0,
            hidden: false,
        })
    }

    fn bar(&self, len: u64, template: &str, chars: &str) -> Result<ProgressBar> {
        let bar = ProgressBar::new(len)
            .with_style(ProgressStyle::with_template(template)?.progress_chars(chars));
        if self.hidden {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        Ok(bar)
    }

    async fn sleep_secs(&self, secs: f64) {
        let secs = secs * self.time_scale;
        if secs > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(secs)).await;
        }
    }

    async fn process_slowly(&self) {
        let jitter: f64 = rand::thread_rng().gen();
        self.sleep_secs(ITEM_DELAY_SECS * jitter).await;
    }

    /// Run all five bars in sequence. Returns the number of committed items.
    pub async fn run(&self) -> Result<u64> {
        let accounts = self.bar(
            self.count,
            "{prefix}  [{bar:36.green}]  {percent:>3}%  {eta}",
            "#-",
        )?;
        accounts.set_prefix("Processing accounts");
        for _ in 0..self.count {
            self.process_slowly().await;
            accounts.inc(1);
        }
        accounts.finish();

        let items = committed_items(self.count, &mut rand::thread_rng());
        let committed = items.len() as u64;
        let commit = self.bar(
            committed,
            "{prefix}  [{bar:36.yellow}]  {percent:>3}%  {msg}",
            "#-",
        )?;
        commit.set_prefix("Committing transaction");
        for item in items {
            commit.set_message(format!("Item #{}", item));
            self.process_slowly().await;
            commit.inc(1);
        }
        commit.finish();

        let counting = self.bar(self.count, "{prefix}  {bar:36.cyan} | {pos}/{len}", "█ ")?;
        counting.set_prefix("Counting");
        for _ in 0..self.count {
            self.process_slowly().await;
            counting.inc(1);
        }
        counting.finish();

        let plain = self.bar(self.count, "[{wide_bar:.magenta}]", "#-")?;
        for _ in 0..self.count {
            self.process_slowly().await;
            plain.inc(1);
        }
        plain.finish();

        let steps = slowing_steps();
        let total: f64 = steps.iter().sum();
        let slowing = self.bar(total as u64, "{prefix}  [{bar:36.green}]  {eta}", "█ ")?;
        slowing.set_prefix("Slowing progress bar");
        let mut done = 0.0;
        for step in steps {
            self.sleep_secs(step).await;
            done += step;
            slowing.set_position(done as u64);
        }
        slowing.finish();

        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_count_range() {
        assert!(ProgressDemo::new(0).is_err());
        assert!(ProgressDemo::new(1).is_ok());
        assert!(ProgressDemo::new(100_000).is_ok());
        assert!(ProgressDemo::new(100_001).is_err());
    }

    #[test]
    fn test_slowing_steps() {
        let steps = slowing_steps();
        assert_eq!(steps.len(), 20);
        assert_eq!(steps[0], 0.0);
        assert!(steps.windows(2).all(|w| w[0] < w[1]));
        let total: f64 = steps.iter().sum();
        assert_eq!(total as u64, 13);
    }

    #[test]
    fn test_committed_items_subset() {
        let mut rng = StdRng::seed_from_u64(7);
        let items = committed_items(1000, &mut rng);
        assert!(items.windows(2).all(|w| w[0] < w[1]));
        assert!(items.len() > 600 && items.len() < 800, "{}", items.len());
    }

    #[tokio::test]
    async fn test_run_hidden() {
        let demo = ProgressDemo {
            count: 50,
            time_scale: 0.0,
            hidden: true,
        };
        let committed = demo.run().await.unwrap();
        assert!(committed <= 50);
    }
}
