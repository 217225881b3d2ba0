//! # 脊柱MRI结构化报告系统
//!
//! 汇总各子模块，供演示程序和上层应用统一引用。

pub use spine_core;
pub use spine_integration;
pub use spine_report;
