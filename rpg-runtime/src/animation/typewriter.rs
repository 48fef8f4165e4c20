//! # Typewriter 模块
//!
//! 逐字显示文本。

use serde::{Deserialize, Serialize};

use crate::drawing::DrawingOnScreen;
use crate::time::{Millisecond, Timer};

/// 打字机效果
///
/// 每 `delay` 毫秒多显示一个字符；一次 `tick` 跨越多个 `delay` 时一次显示多个字符。
/// `delay == 0` 表示立即全部显示。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typewriter {
    text: DrawingOnScreen,
    delay: Millisecond,
    /// 已显示的字符数
    shown: usize,
    timer: Timer,
}

impl Typewriter {
    pub fn new(text: DrawingOnScreen, delay: Millisecond) -> Self {
        let total = char_count(&text);
        let shown = if delay == 0 { total } else { total.min(1) };
        Self {
            text,
            delay,
            shown,
            timer: Timer::new(delay),
        }
    }

    pub fn shown(&self) -> usize {
        self.shown
    }

    pub fn total(&self) -> usize {
        char_count(&self.text)
    }

    pub fn is_complete(&self) -> bool {
        self.shown >= self.total()
    }

    /// 立即显示全部字符
    #[must_use]
    pub fn reveal_all(self) -> Self {
        let shown = self.total();
        Self { shown, ..self }
    }

    #[must_use]
    pub fn tick(self, delta: Millisecond) -> Self {
        if self.is_complete() {
            return self;
        }
        let timer = self.timer.tick(delta);
        if !timer.is_complete() {
            return Self { timer, ..self };
        }
        let shown = (self.shown + (timer.elapsed() / self.delay) as usize).min(self.total());
        Self {
            shown,
            timer: timer.modulo(),
            ..self
        }
    }

    /// 当前可见部分
    pub fn drawing_on_screen(&self) -> DrawingOnScreen {
        self.text.clone().truncate_text(self.shown)
    }

    /// 完整文本（用于淡出阶段）
    pub fn full_text(&self) -> &DrawingOnScreen {
        &self.text
    }
}

fn char_count(text: &DrawingOnScreen) -> usize {
    text.text().map_or(0, |t| t.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{Drawing, Vec2};

    fn hello() -> DrawingOnScreen {
        Drawing::text("Hello", Vec2::new(100.0, 20.0)).at(Vec2::zero())
    }

    #[test]
    fn test_reveals_one_char_per_delay() {
        let typewriter = Typewriter::new(hello(), 10);
        assert_eq!(typewriter.drawing_on_screen().text(), Some("H"));

        let typewriter = typewriter.tick(9);
        assert_eq!(typewriter.shown(), 1);
        let typewriter = typewriter.tick(1);
        assert_eq!(typewriter.drawing_on_screen().text(), Some("He"));
    }

    #[test]
    fn test_multiple_chars_per_tick() {
        let typewriter = Typewriter::new(hello(), 10).tick(25);
        assert_eq!(typewriter.drawing_on_screen().text(), Some("Hel"));
        // 余下的 5ms 被保留
        let typewriter = typewriter.tick(5);
        assert_eq!(typewriter.shown(), 4);
    }

    #[test]
    fn test_completes_and_clamps() {
        let typewriter = Typewriter::new(hello(), 10).tick(1_000);
        assert!(typewriter.is_complete());
        assert_eq!(typewriter.drawing_on_screen().text(), Some("Hello"));
    }

    #[test]
    fn test_zero_delay_and_reveal_all() {
        assert!(Typewriter::new(hello(), 0).is_complete());
        let typewriter = Typewriter::new(hello(), 50).reveal_all();
        assert!(typewriter.is_complete());
        assert_eq!(typewriter.drawing_on_screen().text(), Some("Hello"));
    }
}
