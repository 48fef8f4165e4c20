//! # Cyclic 模块
//!
//! 无限循环的帧动画（角色行走、NPC 待机等）。

use serde::{Deserialize, Serialize};

use crate::drawing::Drawing;
use crate::error::AnimationError;
use crate::time::{Millisecond, Timer};

/// 帧时长
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameDurations {
    /// 所有帧时长相同
    Uniform(Millisecond),
    /// 逐帧时长，长度必须与帧数一致
    PerFrame(Vec<Millisecond>),
}

impl FrameDurations {
    fn get(&self, index: usize) -> Millisecond {
        match self {
            FrameDurations::Uniform(duration) => *duration,
            FrameDurations::PerFrame(durations) => durations[index],
        }
    }
}

/// 循环帧动画
///
/// 自身永不完成。`tick` 一次可以跨越任意多帧，索引按帧数取模回绕。
/// 反序列化同样经过 [`CyclicAnimation::new`] 的校验。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCyclicAnimation")]
pub struct CyclicAnimation {
    frames: Vec<Drawing>,
    durations: FrameDurations,
    index: usize,
    timer: Timer,
}

/// 未经校验的存档形式
#[derive(Deserialize)]
struct RawCyclicAnimation {
    frames: Vec<Drawing>,
    durations: FrameDurations,
    index: usize,
    timer: Timer,
}

impl TryFrom<RawCyclicAnimation> for CyclicAnimation {
    type Error = AnimationError;

    fn try_from(raw: RawCyclicAnimation) -> Result<Self, Self::Error> {
        let animation = Self::new(raw.frames, raw.durations)?;
        if raw.index >= animation.frames.len() {
            return Err(AnimationError::FrameIndexOutOfRange {
                index: raw.index,
                frames: animation.frames.len(),
            });
        }
        Ok(Self {
            index: raw.index,
            timer: raw.timer,
            ..animation
        })
    }
}

impl CyclicAnimation {
    /// 创建循环动画
    ///
    /// 帧列表不能为空，帧时长必须为正，逐帧时长数量必须与帧数一致。
    pub fn new(frames: Vec<Drawing>, durations: FrameDurations) -> Result<Self, AnimationError> {
        if frames.is_empty() {
            return Err(AnimationError::EmptyFrames);
        }
        match &durations {
            FrameDurations::Uniform(0) => {
                return Err(AnimationError::ZeroFrameDuration { index: 0 });
            }
            FrameDurations::Uniform(_) => {}
            FrameDurations::PerFrame(list) => {
                if list.len() != frames.len() {
                    return Err(AnimationError::FrameCountMismatch {
                        frames: frames.len(),
                        durations: list.len(),
                    });
                }
                if let Some(index) = list.iter().position(|d| *d == 0) {
                    return Err(AnimationError::ZeroFrameDuration { index });
                }
            }
        }

        let timer = Timer::new(durations.get(0));
        Ok(Self {
            frames,
            durations,
            index: 0,
            timer,
        })
    }

    /// 单帧静态动画
    pub fn still(frame: Drawing) -> Self {
        Self {
            frames: vec![frame],
            durations: FrameDurations::Uniform(Millisecond::MAX),
            index: 0,
            timer: Timer::new(Millisecond::MAX),
        }
    }

    /// 当前帧
    pub fn drawing(&self) -> &Drawing {
        &self.frames[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// 当前帧已播放的时长
    pub fn elapsed(&self) -> Millisecond {
        self.timer.elapsed()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_complete(&self) -> bool {
        false
    }

    /// 回到第 0 帧并重置计时器
    #[must_use]
    pub fn reset(self) -> Self {
        let timer = Timer::new(self.durations.get(0));
        Self {
            index: 0,
            timer,
            ..self
        }
    }

    /// 推进时间
    ///
    /// 溢出量先对整轮时长取模，再逐帧扣除，每一帧使用它自己的时长，
    /// 直到剩余量小于下一帧时长，最后以剩余量播种新计时器。
    #[must_use]
    pub fn tick(self, delta: Millisecond) -> Self {
        let timer = self.timer.tick(delta);
        if !timer.is_complete() {
            return Self { timer, ..self };
        }

        let len = self.frames.len();
        let mut carry = timer.elapsed() - timer.duration();
        let mut index = (self.index + 1) % len;

        let cycle = self.cycle_duration();
        if cycle > 0 {
            carry %= cycle;
        }
        while carry >= self.durations.get(index) {
            carry -= self.durations.get(index);
            index = (index + 1) % len;
        }

        let timer = Timer::new(self.durations.get(index)).tick(carry);
        Self {
            index,
            timer,
            ..self
        }
    }

    /// 整轮时长（饱和求和）
    fn cycle_duration(&self) -> Millisecond {
        (0..self.frames.len())
            .map(|i| self.durations.get(i))
            .fold(0, Millisecond::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::Vec2;

    fn frame(name: &str) -> Drawing {
        Drawing::sprite(name, Vec2::new(16.0, 16.0))
    }

    fn abc(durations: FrameDurations) -> CyclicAnimation {
        CyclicAnimation::new(vec![frame("A"), frame("B"), frame("C")], durations).unwrap()
    }

    fn current(animation: &CyclicAnimation) -> &str {
        match &animation.drawing().kind {
            crate::drawing::DrawingKind::Sprite(name) => name,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_uniform_frame_progression() {
        let animation = abc(FrameDurations::Uniform(5));
        assert_eq!(current(&animation), "A");

        let animation = animation.tick(1).tick(4);
        assert_eq!(current(&animation), "B");
        assert_eq!(animation.elapsed(), 0);

        let animation = animation.tick(6);
        assert_eq!(current(&animation), "C");
        assert_eq!(animation.elapsed(), 1);

        let animation = animation.reset();
        assert_eq!(current(&animation), "A");
        assert_eq!(animation.elapsed(), 0);
    }

    #[test]
    fn test_multi_cycle_catch_up_wraps() {
        let animation = abc(FrameDurations::Uniform(5));
        // 1_000_003 = 66_666 轮 (15ms) + 13ms，落在 C 的第 3ms
        let animation = animation.tick(1_000_003);
        assert_eq!(current(&animation), "C");
        assert_eq!(animation.elapsed(), 3);
        assert!(!animation.is_complete());
    }

    #[test]
    fn test_per_frame_durations() {
        let animation = abc(FrameDurations::PerFrame(vec![2, 10, 3]));
        let animation = animation.tick(2);
        assert_eq!(current(&animation), "B");
        let animation = animation.tick(9);
        assert_eq!(current(&animation), "B");
        let animation = animation.tick(1);
        assert_eq!(current(&animation), "C");
        // C(3) + A(2) + B 的第 1ms
        let animation = animation.tick(6);
        assert_eq!(current(&animation), "B");
        assert_eq!(animation.elapsed(), 1);
    }

    #[test]
    fn test_invalid_construction() {
        assert_eq!(
            CyclicAnimation::new(vec![], FrameDurations::Uniform(5)),
            Err(AnimationError::EmptyFrames)
        );
        assert_eq!(
            CyclicAnimation::new(vec![frame("A")], FrameDurations::Uniform(0)),
            Err(AnimationError::ZeroFrameDuration { index: 0 })
        );
        assert_eq!(
            CyclicAnimation::new(vec![frame("A")], FrameDurations::PerFrame(vec![1, 2])),
            Err(AnimationError::FrameCountMismatch {
                frames: 1,
                durations: 2
            })
        );
        assert_eq!(
            CyclicAnimation::new(
                vec![frame("A"), frame("B")],
                FrameDurations::PerFrame(vec![4, 0])
            ),
            Err(AnimationError::ZeroFrameDuration { index: 1 })
        );
    }

    #[test]
    fn test_still_never_advances() {
        let animation = CyclicAnimation::still(frame("A")).tick(1_000_000);
        assert_eq!(current(&animation), "A");
        assert_eq!(animation.frame_count(), 1);
    }

    #[test]
    fn test_deserialize_validates_frames() {
        let animation = abc(FrameDurations::PerFrame(vec![3, 4, 5])).tick(5);
        let json = serde_json::to_value(&animation).unwrap();
        let restored: CyclicAnimation = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(restored, animation);

        let mut empty = json.clone();
        empty["frames"] = serde_json::json!([]);
        assert!(serde_json::from_value::<CyclicAnimation>(empty).is_err());

        let mut zero = json.clone();
        zero["durations"] = serde_json::json!({ "uniform": 0 });
        assert!(serde_json::from_value::<CyclicAnimation>(zero).is_err());

        let mut index = json;
        index["index"] = serde_json::json!(3);
        let err = serde_json::from_value::<CyclicAnimation>(index).unwrap_err();
        assert!(err.to_string().contains("帧序号 3 超出帧数 3"));
    }
}
