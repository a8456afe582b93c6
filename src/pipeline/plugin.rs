use serde::Serialize;

/// The role a section plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Input,
    Decoder,
    Filter,
    Output,
    Encoder,
    Accumulator,
}

impl SectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Input => "input",
            SectionKind::Decoder => "decoder",
            SectionKind::Filter => "filter",
            SectionKind::Output => "output",
            SectionKind::Encoder => "encoder",
            SectionKind::Accumulator => "accumulator",
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The expected shape of a known parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Str,
    /// A non-empty file or directory path.
    Path,
    /// `host:port`, host may be empty (`:8125`) or bracketed IPv6.
    Address,
    /// `scheme://host[...]`.
    Url,
    /// Whole seconds, non-negative.
    Interval,
    Integer,
    Bool,
    StrList,
    /// A message matcher expression.
    Matcher,
    /// The name of another section of the given kind.
    Reference(SectionKind),
    /// A list of names of other sections of the given kind.
    ReferenceList(SectionKind),
}

/// One known parameter of a plugin type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub key: &'static str,
    pub ty: ParamType,
    pub required: bool,
}

const fn opt(key: &'static str, ty: ParamType) -> ParamSpec {
    ParamSpec {
        key,
        ty,
        required: false,
    }
}

const fn req(key: &'static str, ty: ParamType) -> ParamSpec {
    ParamSpec {
        key,
        ty,
        required: true,
    }
}

use ParamType::{
    Address, Bool, Integer, Interval, Matcher, Path, Reference, ReferenceList, Str, StrList, Url,
};

const INPUT_COMMON: &[ParamSpec] = &[opt("decoder", Reference(SectionKind::Decoder))];
const FILTER_COMMON: &[ParamSpec] = &[
    req("message_matcher", Matcher),
    opt("ticker_interval", Interval),
];
const OUTPUT_COMMON: &[ParamSpec] = &[
    req("message_matcher", Matcher),
    opt("encoder", Reference(SectionKind::Encoder)),
    opt("ticker_interval", Interval),
];
const SANDBOX: &[ParamSpec] = &[
    req("filename", Path),
    opt("module_directory", Path),
    opt("memory_limit", Integer),
    opt("instruction_limit", Integer),
    opt("output_limit", Integer),
    opt("preserve_data", Bool),
];

/// Keys only some kinds may carry, and the kinds allowed to carry them.
pub const KIND_RESTRICTED: &[(&str, &[SectionKind])] = &[
    ("decoder", &[SectionKind::Input]),
    ("encoder", &[SectionKind::Output]),
    (
        "message_matcher",
        &[SectionKind::Filter, SectionKind::Output],
    ),
];

macro_rules! plugin_types {
    ($($variant:ident => $kind:ident, [$($spec:expr),* $(,)?]);* $(;)?) => {
        /// Every plugin type a section may declare.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum PluginType {
            $($variant),*
        }

        impl PluginType {
            pub const ALL: &'static [PluginType] = &[$(PluginType::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(PluginType::$variant => stringify!($variant)),*
                }
            }

            pub fn kind(self) -> SectionKind {
                match self {
                    $(PluginType::$variant => SectionKind::$kind),*
                }
            }

            /// Parameters specific to this plugin type.
            fn own_params(self) -> &'static [ParamSpec] {
                match self {
                    $(PluginType::$variant => {
                        const PARAMS: &[ParamSpec] = &[$($spec),*];
                        PARAMS
                    }),*
                }
            }
        }
    };
}

plugin_types! {
    StatsdInput => Input, [
        opt("address", Address),
        opt("stat_accum_name", Reference(SectionKind::Accumulator)),
        opt("max_msg_size", Integer),
    ];
    StatAccumInput => Accumulator, [
        opt("ticker_interval", Interval),
        opt("emit_in_fields", Bool),
        opt("emit_in_payload", Bool),
        opt("percent_threshold", Integer),
        opt("message_type", Str),
        opt("legacy_namespaces", Bool),
        opt("global_prefix", Str),
    ];
    DockerStatsInput => Input, [
        opt("endpoint", Str),
        opt("cert_path", Path),
        opt("name_from_env_var", Str),
        opt("fields_from_env", StrList),
    ];
    DockerLogInput => Input, [
        opt("endpoint", Str),
        opt("cert_path", Path),
    ];
    FilePollingInput => Input, [
        req("file_path", Path),
        req("ticker_interval", Interval),
    ];
    ProcessInput => Input, [
        opt("ticker_interval", Interval),
        opt("immediate_start", Bool),
        opt("stdout", Bool),
        opt("stderr", Bool),
    ];
    TcpInput => Input, [
        req("address", Address),
        opt("use_tls", Bool),
    ];
    UdpInput => Input, [
        req("address", Address),
    ];
    LogstreamerInput => Input, [
        req("log_directory", Path),
        req("file_match", Str),
        opt("priority", StrList),
        opt("rescan_interval", Str),
        opt("oldest_duration", Str),
    ];
    SandboxDecoder => Decoder, [];
    ProtobufDecoder => Decoder, [];
    PayloadRegexDecoder => Decoder, [
        req("match_regex", Str),
        opt("timestamp_layout", Str),
    ];
    MultiDecoder => Decoder, [
        req("subs", ReferenceList(SectionKind::Decoder)),
        opt("cascade_strategy", Str),
        opt("log_sub_errors", Bool),
    ];
    SandboxFilter => Filter, [];
    StatFilter => Filter, [
        opt("stat_accum_name", Reference(SectionKind::Accumulator)),
    ];
    CounterFilter => Filter, [];
    ProtobufEncoder => Encoder, [];
    PayloadEncoder => Encoder, [
        opt("append_newlines", Bool),
        opt("prefix_ts", Bool),
        opt("ts_format", Str),
    ];
    RstEncoder => Encoder, [];
    SandboxEncoder => Encoder, [];
    TcpOutput => Output, [
        req("address", Address),
        opt("use_tls", Bool),
        opt("keep_alive", Bool),
        opt("keep_alive_period", Integer),
        opt("use_buffering", Bool),
    ];
    UdpOutput => Output, [
        req("address", Address),
    ];
    LogOutput => Output, [];
    FileOutput => Output, [
        req("path", Path),
        opt("perm", Str),
        opt("folder_perm", Str),
        opt("flush_interval", Integer),
        opt("use_framing", Bool),
    ];
    HttpOutput => Output, [
        req("address", Url),
        opt("method", Str),
        opt("username", Str),
        opt("password", Str),
        opt("http_timeout", Integer),
    ];
    DashboardOutput => Output, [
        opt("address", Address),
        opt("static_directory", Path),
        opt("working_directory", Path),
    ];
    CarbonOutput => Output, [
        req("address", Address),
        opt("protocol", Str),
    ];
}

impl PluginType {
    pub fn from_name(name: &str) -> Option<PluginType> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    fn is_sandbox(self) -> bool {
        matches!(
            self,
            PluginType::SandboxDecoder | PluginType::SandboxFilter | PluginType::SandboxEncoder
        )
    }

    /// Every known parameter of this plugin: kind-wide ones, then its own.
    pub fn params(self) -> impl Iterator<Item = &'static ParamSpec> {
        let common = match self.kind() {
            SectionKind::Input => INPUT_COMMON,
            SectionKind::Filter => FILTER_COMMON,
            SectionKind::Output => OUTPUT_COMMON,
            SectionKind::Decoder | SectionKind::Encoder | SectionKind::Accumulator => &[],
        };
        let sandbox: &'static [ParamSpec] = if self.is_sandbox() { SANDBOX } else { &[] };
        common
            .iter()
            .chain(sandbox.iter())
            .chain(self.own_params().iter())
    }

    pub fn param(self, key: &str) -> Option<&'static ParamSpec> {
        self.params().find(|p| p.key == key)
    }
}

impl std::fmt::Display for PluginType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
