//! # Tween 模块
//!
//! 补间实例：一组属性在同一时间轴上从起始值过渡到目标值。
//!
//! 补间不持有元素，只负责时间轴；调度器每帧读取 [`Tween::values`] 并写回元素。

use crate::easing::EasingFunction;
use crate::intent::Property;

/// 补间状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenState {
    /// 等待开始（有延迟）
    #[default]
    Pending,
    /// 正在播放
    Playing,
    /// 已完成
    Completed,
    /// 已被取消（停留在取消时的值）
    Killed,
}

impl TweenState {
    /// 是否为活跃状态（需要更新）
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Playing)
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Killed)
    }
}

/// 单个属性轨道
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub property: Property,
    pub from: f32,
    pub to: f32,
}

impl Track {
    pub fn new(property: Property, from: f32, to: f32) -> Self {
        Self { property, from, to }
    }
}

/// 补间实例
#[derive(Debug, Clone)]
pub struct Tween {
    tracks: Vec<Track>,
    /// 时长（秒）
    duration: f32,
    /// 延迟启动（秒）
    delay: f32,
    easing: EasingFunction,
    state: TweenState,
    /// 当前进度（0.0 - 1.0，已应用缓动）
    progress: f32,
    elapsed: f32,
}

impl Tween {
    /// 创建新的补间
    pub fn new(tracks: Vec<Track>, duration: f32) -> Self {
        Self {
            tracks,
            duration: duration.max(0.0),
            delay: 0.0,
            easing: EasingFunction::default(),
            state: TweenState::Pending,
            progress: 0.0,
            elapsed: 0.0,
        }
    }

    /// 设置缓动函数
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// 设置延迟
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// 更新补间
    ///
    /// # 返回
    /// - `true`: 补间仍在进行中
    /// - `false`: 补间已结束
    pub fn update(&mut self, dt: f32) -> bool {
        match self.state {
            TweenState::Pending => {
                self.elapsed += dt;
                if self.elapsed >= self.delay {
                    self.state = TweenState::Playing;
                    self.elapsed -= self.delay;
                    self.update_playing()
                } else {
                    true
                }
            }
            TweenState::Playing => {
                self.elapsed += dt;
                self.update_playing()
            }
            TweenState::Completed | TweenState::Killed => false,
        }
    }

    fn update_playing(&mut self) -> bool {
        if self.duration <= 0.0 {
            self.finish();
            return false;
        }

        let raw_progress = self.elapsed / self.duration;
        if raw_progress >= 1.0 {
            self.finish();
            false
        } else {
            self.progress = self.easing.apply(raw_progress);
            true
        }
    }

    /// 立即跳到终点
    pub fn finish(&mut self) {
        self.progress = 1.0;
        self.state = TweenState::Completed;
    }

    /// 取消补间，冻结在当前进度（不回弹）
    pub fn kill(&mut self) {
        if self.state.is_active() {
            self.state = TweenState::Killed;
        }
    }

    /// 当前各属性值
    pub fn values(&self) -> impl Iterator<Item = (Property, f32)> + '_ {
        self.tracks.iter().map(|track| {
            let value = track.from + (track.to - track.from) * self.progress;
            (track.property, value)
        })
    }

    /// 各属性的终值
    pub fn final_values(&self) -> impl Iterator<Item = (Property, f32)> + '_ {
        self.tracks.iter().map(|track| (track.property, track.to))
    }

    pub fn state(&self) -> TweenState {
        self.state
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }
}
