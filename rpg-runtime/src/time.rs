//! # Time 模块
//!
//! 计时器与倒计时，所有定时效果的基础。
//!
//! ## 设计说明
//!
//! - 时间单位统一为整数毫秒，循环动画与打字机的追帧计算因此是精确的
//! - `Timer` 是 `Copy` 值类型，所有操作返回新值，不做原地修改
//! - `duration == 0` 视为已完成，百分比计算不会除零

use serde::{Deserialize, Serialize};

/// 毫秒
pub type Millisecond = u64;

/// 计时方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimerDirection {
    /// 正向：elapsed 从 0 增长，无上界
    #[default]
    Forward,
    /// 倒计时：elapsed 从 duration 递减，钳制在 0
    Countdown,
}

/// 计时器
///
/// 正向计时器在 `elapsed >= duration` 时完成；倒计时在 `elapsed == 0` 时完成。
/// `completed_percentage` 始终是 `elapsed / duration`，因此倒计时的完成度
/// 从 1 走向 0，这正是 `reverse` 让效果时间倒流的方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    duration: Millisecond,
    elapsed: Millisecond,
    direction: TimerDirection,
}

impl Timer {
    /// 创建正向计时器
    pub const fn new(duration: Millisecond) -> Self {
        Self {
            duration,
            elapsed: 0,
            direction: TimerDirection::Forward,
        }
    }

    /// 创建倒计时（初始 elapsed = duration）
    pub const fn new_countdown(duration: Millisecond) -> Self {
        Self {
            duration,
            elapsed: duration,
            direction: TimerDirection::Countdown,
        }
    }

    pub fn duration(&self) -> Millisecond {
        self.duration
    }

    pub fn elapsed(&self) -> Millisecond {
        self.elapsed
    }

    pub fn direction(&self) -> TimerDirection {
        self.direction
    }

    pub fn is_countdown(&self) -> bool {
        self.direction == TimerDirection::Countdown
    }

    /// 推进时间
    ///
    /// 正向计时器饱和加法（不封顶于 duration，溢出量供 `modulo` 使用）；
    /// 倒计时减法并钳制在 0。
    #[must_use]
    pub fn tick(self, delta: Millisecond) -> Self {
        let elapsed = match self.direction {
            TimerDirection::Forward => self.elapsed.saturating_add(delta),
            TimerDirection::Countdown => self.elapsed.saturating_sub(delta),
        };
        Self { elapsed, ..self }
    }

    /// 重置到初始状态
    #[must_use]
    pub fn reset(self) -> Self {
        match self.direction {
            TimerDirection::Forward => Self::new(self.duration),
            TimerDirection::Countdown => Self::new_countdown(self.duration),
        }
    }

    /// 将 elapsed 折回 `[0, duration)`
    ///
    /// 用于循环计时器溢出后重新播种。`duration == 0` 时返回重置后的计时器。
    #[must_use]
    pub fn modulo(self) -> Self {
        if self.duration == 0 {
            return self.reset();
        }
        match self.direction {
            TimerDirection::Forward => Self {
                elapsed: self.elapsed % self.duration,
                ..self
            },
            TimerDirection::Countdown => self,
        }
    }

    /// 同时长的全新倒计时
    #[must_use]
    pub fn countdown(self) -> Self {
        Self::new_countdown(self.duration)
    }

    /// 时间反转
    ///
    /// 翻转计时方向并镜像 elapsed（`e -> duration - e`），使反转后的
    /// 完成度曲线与原曲线在同一时刻首尾对称。对 `e <= duration` 的计时器，
    /// 两次反转得到原值。
    #[must_use]
    pub fn reversed(self) -> Self {
        let elapsed = self.duration.saturating_sub(self.elapsed);
        let direction = match self.direction {
            TimerDirection::Forward => TimerDirection::Countdown,
            TimerDirection::Countdown => TimerDirection::Forward,
        };
        Self {
            duration: self.duration,
            elapsed,
            direction,
        }
    }

    pub fn is_complete(&self) -> bool {
        match self.direction {
            TimerDirection::Forward => self.elapsed >= self.duration,
            TimerDirection::Countdown => self.elapsed == 0,
        }
    }

    /// 正向计时器是否已超时（elapsed 严格大于 duration）
    pub fn is_overdue(&self) -> bool {
        self.direction == TimerDirection::Forward && self.elapsed > self.duration
    }

    /// `elapsed / duration`，钳制在 `[0, 1]`
    pub fn completed_percentage(&self) -> f32 {
        if self.duration == 0 {
            return 1.0;
        }
        (self.elapsed as f64 / self.duration as f64).clamp(0.0, 1.0) as f32
    }

    /// 距离 duration 的剩余时长（正向超时后为 0）
    pub fn remaining(&self) -> Millisecond {
        self.duration.saturating_sub(self.elapsed)
    }

    /// `remaining / duration`，钳制在 `[0, 1]`
    pub fn remaining_percentage(&self) -> f32 {
        if self.duration == 0 {
            return 0.0;
        }
        (self.remaining() as f64 / self.duration as f64).clamp(0.0, 1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_tick_and_complete() {
        let timer = Timer::new(100);
        assert!(!timer.is_complete());

        let timer = timer.tick(60);
        assert_eq!(timer.elapsed(), 60);
        assert!(!timer.is_complete());

        let timer = timer.tick(60);
        assert_eq!(timer.elapsed(), 120);
        assert!(timer.is_complete());
        assert!(timer.is_overdue());
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn test_percentages_sum_to_one() {
        for duration in [1u64, 7, 100, 333] {
            for elapsed in 0..=duration {
                let timer = Timer::new(duration).tick(elapsed);
                let sum = timer.completed_percentage() + timer.remaining_percentage();
                assert!((sum - 1.0).abs() < 1e-5, "d={duration} e={elapsed}");

                let countdown = Timer::new_countdown(duration).tick(duration - elapsed);
                let sum = countdown.completed_percentage() + countdown.remaining_percentage();
                assert!((sum - 1.0).abs() < 1e-5, "d={duration} e={elapsed}");
            }
        }
    }

    #[test]
    fn test_countdown_clamps_at_zero() {
        let countdown = Timer::new_countdown(50);
        assert_eq!(countdown.elapsed(), 50);
        assert!(countdown.tick(50).is_complete());

        let over = countdown.tick(51);
        assert_eq!(over.elapsed(), 0);
        assert!(over.is_complete());
        assert!(!over.is_overdue());
    }

    #[test]
    fn test_zero_duration_is_complete() {
        let timer = Timer::new(0);
        assert!(timer.is_complete());
        assert_eq!(timer.completed_percentage(), 1.0);
        assert_eq!(timer.remaining_percentage(), 0.0);
        assert!(Timer::new_countdown(0).is_complete());
        assert_eq!(timer.tick(5).modulo(), Timer::new(0));
    }

    #[test]
    fn test_modulo_wraps_overflow() {
        let timer = Timer::new(10).tick(27).modulo();
        assert_eq!(timer.elapsed(), 7);
        assert!(!timer.is_complete());
    }

    #[test]
    fn test_reset() {
        assert_eq!(Timer::new(10).tick(4).reset().elapsed(), 0);
        assert_eq!(Timer::new_countdown(10).tick(4).reset().elapsed(), 10);
    }

    #[test]
    fn test_countdown_conversion() {
        let countdown = Timer::new(30).tick(12).countdown();
        assert!(countdown.is_countdown());
        assert_eq!(countdown.elapsed(), 30);
        assert_eq!(countdown.duration(), 30);
    }

    #[test]
    fn test_reversed_round_trip() {
        let timer = Timer::new(40).tick(15);
        let reversed = timer.reversed();
        assert!(reversed.is_countdown());
        assert_eq!(reversed.elapsed(), 25);
        assert_eq!(reversed.reversed(), timer);

        let fresh = Timer::new(40).reversed();
        assert_eq!(fresh, Timer::new_countdown(40));
    }
}
