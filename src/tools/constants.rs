//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// DR分析算法常量
pub mod dr_analysis {
    /// 统计窗口时长（秒）
    ///
    /// 每个声道按 `sample_rate * 3` 个样本划分窗口
    pub const WINDOW_DURATION_SECONDS: u32 = 3;

    /// 参与二阶RMS计算的窗口比例的倒数（取最响的 1/5）
    pub const TOP_WINDOW_DIVISOR: usize = 5;

    /// 至少需要这么多窗口才使用第二大峰值作为参考峰值
    pub const MIN_WINDOWS_FOR_SECOND_PEAK: usize = 3;
}

/// 波形图常量
pub mod waveform {
    /// 每秒的波形块数（每块约250毫秒）
    pub const CHUNKS_PER_SECOND: u32 = 4;

    /// 输出字节的满量程（0-200）
    pub const SCALE: f64 = 200.0;

    /// 静音裁切阈值（字节刻度，严格大于才算非静音）
    ///
    /// 等价于归一化刻度上的 0.05，统一只在字节刻度上比较
    pub const TRIM_THRESHOLD: u8 = 10;

    /// 对称平滑核：下标0为自身权重，下标1..3为两侧对应偏移的权重
    pub const SMOOTHING_WEIGHTS: [f64; 4] = [10.0, 8.0, 5.0, 3.0];
}

/// 声道检测常量
pub mod channel_balance {
    /// 伪立体声判定阈值（每帧平均声道差）
    ///
    /// 经验值，可调；低于此值的双声道音轨被报告为单声道
    pub const FALSE_STEREO_THRESHOLD: f64 = 1e-4;
}

/// 输出协议常量
pub mod protocol {
    /// 扫描器与成像器之间的握手版本号
    pub const PROTOCOL_VERSION: &str = "CITRUS";

    pub const MARKER_START: &str = "WAVEPLOT_START";
    pub const MARKER_DR: &str = "WAVEPLOT_DR";
    pub const MARKER_INFO: &str = "WAVEPLOT_INFO";
    pub const MARKER_END: &str = "WAVEPLOT_END";

    /// INFO 段的字段分隔符
    pub const INFO_SEPARATOR: char = '|';
}

/// 默认配置值
pub mod defaults {
    /// 默认最大可分析时长（秒），约50分钟
    pub const MAX_DURATION_SECS: u32 = 3000;

    /// 默认多文件并行并发度
    pub const PARALLEL_FILES_DEGREE: usize = 4;

    /// 批量模式台账文件名（位于扫描目录下）
    pub const LEDGER_FILE_NAME: &str = ".waveplot_ledger.json";
}

/// 并发度限制常量
pub mod parallel_limits {
    /// 最小并发度
    pub const MIN_PARALLEL_DEGREE: usize = 1;

    /// 最大并发度
    ///
    /// 限制最大并发度为16，避免上下文切换和内存占用过高
    pub const MAX_PARALLEL_DEGREE: usize = 16;
}
