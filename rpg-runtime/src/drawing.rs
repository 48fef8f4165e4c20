//! # Drawing 模块
//!
//! 屏幕空间可绘制对象。
//!
//! Runtime 不做任何渲染，只产出按从后到前排序的 [`DrawingOnScreen`] 列表，
//! 由 Host 负责真正绘制。

use serde::{Deserialize, Serialize};

/// 二维向量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// 线性插值
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// 轴对齐矩形
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top_left: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            top_left: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn right(&self) -> f32 {
        self.top_left.x + self.size.x
    }

    pub fn bottom(&self) -> f32 {
        self.top_left.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.top_left + self.size.scaled(0.5)
    }

    /// 是否与另一矩形重叠（边缘相接不算）
    pub fn collide(&self, other: &Rect) -> bool {
        self.top_left.x < other.right()
            && other.top_left.x < self.right()
            && self.top_left.y < other.bottom()
            && other.top_left.y < self.bottom()
    }

    /// 四周各扩展 `padding`
    pub fn inflate(&self, padding: f32) -> Self {
        Self {
            top_left: self.top_left - Vec2::new(padding, padding),
            size: self.size + Vec2::new(padding * 2.0, padding * 2.0),
        }
    }

    pub fn translate(&self, offset: Vec2) -> Self {
        Self {
            top_left: self.top_left + offset,
            size: self.size,
        }
    }
}

/// 变换状态
///
/// 以绘制对象中心为原点缩放，然后平移，最后乘透明度。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// 位置偏移
    pub offset: Vec2,
    /// 均匀缩放因子
    pub scale: f32,
    /// 透明度 (0.0 - 1.0)
    pub alpha: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            offset: Vec2::zero(),
            scale: 1.0,
            alpha: 1.0,
        }
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self::default()
    }

    /// 叠加另一变换：偏移相加，缩放与透明度相乘
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            offset: self.offset + other.offset,
            scale: self.scale * other.scale,
            alpha: (self.alpha * other.alpha).clamp(0.0, 1.0),
        }
    }
}

/// 可绘制内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawingKind {
    /// 精灵图（路径由 Host 解析）
    Sprite(String),
    /// 文本
    Text(String),
    /// 纯色矩形 (RGBA)
    Rectangle([u8; 4]),
}

/// 可绘制对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub kind: DrawingKind,
    pub size: Vec2,
}

impl Drawing {
    pub fn sprite(path: impl Into<String>, size: Vec2) -> Self {
        Self {
            kind: DrawingKind::Sprite(path.into()),
            size,
        }
    }

    pub fn text(content: impl Into<String>, size: Vec2) -> Self {
        Self {
            kind: DrawingKind::Text(content.into()),
            size,
        }
    }

    pub fn rectangle(rgba: [u8; 4], size: Vec2) -> Self {
        Self {
            kind: DrawingKind::Rectangle(rgba),
            size,
        }
    }

    /// 放置到屏幕坐标
    pub fn at(self, top_left: Vec2) -> DrawingOnScreen {
        DrawingOnScreen::new(self, top_left)
    }
}

/// 屏幕上的可绘制对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingOnScreen {
    pub drawing: Drawing,
    pub top_left: Vec2,
    #[serde(default)]
    pub transform: Transform,
}

impl DrawingOnScreen {
    pub fn new(drawing: Drawing, top_left: Vec2) -> Self {
        Self {
            drawing,
            top_left,
            transform: Transform::identity(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            top_left: self.top_left,
            size: self.drawing.size,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.transform.alpha
    }

    /// 透明度乘以 `factor`
    #[must_use]
    pub fn fade(mut self, factor: f32) -> Self {
        self.transform.alpha = (self.transform.alpha * factor).clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn shift(mut self, offset: Vec2) -> Self {
        self.transform.offset = self.transform.offset + offset;
        self
    }

    #[must_use]
    pub fn scale(mut self, factor: f32) -> Self {
        self.transform.scale *= factor;
        self
    }

    /// 文本只保留前 `chars` 个字符，非文本原样返回
    #[must_use]
    pub fn truncate_text(mut self, chars: usize) -> Self {
        if let DrawingKind::Text(content) = &self.drawing.kind {
            let truncated: String = content.chars().take(chars).collect();
            self.drawing.kind = DrawingKind::Text(truncated);
        }
        self
    }

    /// 文本内容（非文本返回 None）
    pub fn text(&self) -> Option<&str> {
        match &self.drawing.kind {
            DrawingKind::Text(content) => Some(content),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_lerp() {
        let mid = Vec2::new(0.0, 0.0).lerp(Vec2::new(10.0, 20.0), 0.5);
        assert_eq!(mid, Vec2::new(5.0, 10.0));
    }

    #[test]
    fn test_rect_collide_and_inflate() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.collide(&b));
        assert!(a.inflate(1.0).collide(&b));
        assert_eq!(a.inflate(1.0).top_left, Vec2::new(-1.0, -1.0));
        assert_eq!(a.center(), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_drawing_transforms() {
        let d = Drawing::text("Hello", Vec2::new(50.0, 10.0))
            .at(Vec2::new(1.0, 2.0))
            .fade(0.5)
            .fade(0.5)
            .shift(Vec2::new(3.0, 0.0))
            .truncate_text(2);
        assert!((d.alpha() - 0.25).abs() < 1e-6);
        assert_eq!(d.transform.offset, Vec2::new(3.0, 0.0));
        assert_eq!(d.text(), Some("He"));
    }

    #[test]
    fn test_transform_then() {
        let a = Transform {
            offset: Vec2::new(1.0, 1.0),
            scale: 2.0,
            alpha: 0.5,
        };
        let combined = a.then(&a);
        assert_eq!(combined.offset, Vec2::new(2.0, 2.0));
        assert_eq!(combined.scale, 4.0);
        assert_eq!(combined.alpha, 0.25);
    }
}
