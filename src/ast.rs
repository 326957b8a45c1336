//! Tagged-union AST node model.
//!
//! `NodeKind` is a closed enum: the discriminant *is* the payload type, so
//! "reading a mismatched variant" is a compile error rather than a runtime
//! bug class. Nodes live in one arena per compile (`Ast`); a node's
//! identity is a stable `NodeId` index, never a pointer, so the whole tree
//! drops for free when the `Ast` drops. Larger payloads are boxed to keep
//! `NodeKind` itself small regardless of which variant is live.

use crate::intern::StrId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// Arena owning every node produced by a single compile.
#[derive(Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Ast { nodes: Vec::new() }
    }

    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The 31-value closed binary-operator set (spec §3). Precedence is
/// computed from this enum, never from the token kind that spelled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    AddWrap,
    AddSat,
    Sub,
    SubWrap,
    SubSat,
    Mul,
    MulWrap,
    MulSat,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    ShlSat,
    Shr,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LogicalAnd,
    LogicalOr,
    ArrayCat,
    ArrayMult,
    ErrorUnionMerge,
    Orelse,
    Catch,
    MergeErrorSets,
}

impl BinOp {
    /// 8 precedence levels, left-associative; higher number binds tighter.
    pub fn precedence(self) -> u8 {
        use BinOp::*;
        match self {
            Catch => 1,
            Orelse => 2,
            LogicalOr | MergeErrorSets => 3,
            LogicalAnd => 4,
            Eq | NotEq | Lt | LtEq | Gt | GtEq => 5,
            BitAnd | BitOr | BitXor | Shl | ShlSat | Shr => 6,
            Add | AddWrap | AddSat | Sub | SubWrap | SubSat | ArrayCat | ArrayMult
            | ErrorUnionMerge => 7,
            Mul | MulWrap | MulSat | Div | Mod => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    BitNot,
    LogicalNot,
    AddressOf,
    Try,
    NegateWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    ShlAssign,
    ShrAssign,
}

/// Pointer/array prefix-type-op subtag (spec §6:
/// `prefix_type_op_{optional,anyframe,slice,ptr,array}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixTypeOpKind {
    Optional,
    Anyframe,
    Slice,
    Ptr,
    Array,
}

/// Suffix-type-op subtag (spec §6:
/// `suffix_type_op_{slice,named_access,deref,assert_maybe}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixTypeOpKind {
    Slice,
    NamedAccess,
    Deref,
    AssertMaybe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitListKind {
    Field,
    Expr,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Struct,
    Union,
    Enum,
    Opaque,
}

pub struct ParamDecl {
    pub name: Option<StrId>,
    pub is_comptime: bool,
    pub is_noalias: bool,
    pub type_expr: Option<NodeId>,
    pub is_varargs: bool,
}

pub struct FnProtoData {
    pub name: Option<StrId>,
    pub params: Vec<ParamDecl>,
    pub return_type: Option<NodeId>,
    pub is_pub: bool,
    pub is_export: bool,
    pub is_extern: bool,
    pub is_inline: bool,
}

pub struct DeclFnData {
    pub proto: Box<FnProtoData>,
    pub body: Option<NodeId>,
}

pub struct VarDeclData {
    pub name: StrId,
    pub is_const: bool,
    pub is_pub: bool,
    pub type_expr: Option<NodeId>,
    pub init: Option<NodeId>,
}

pub struct BinaryExprData {
    pub op: BinOp,
    pub lhs: NodeId,
    pub rhs: NodeId,
}

pub struct UnaryExprData {
    pub ops: Vec<UnaryOp>,
    pub inner: NodeId,
}

pub struct SingleAssignExprData {
    pub op: AssignOp,
    pub lhs: NodeId,
    pub rhs: NodeId,
}

pub struct MultiAssignExprData {
    pub lhs: Vec<NodeId>,
    pub rhs: NodeId,
}

pub struct IfStatementData {
    pub cond: NodeId,
    pub payload: Option<StrId>,
    pub then_branch: NodeId,
    pub else_branch: Option<NodeId>,
}

pub struct IfExprData {
    pub cond: NodeId,
    pub payload: Option<StrId>,
    pub then_expr: NodeId,
    pub else_expr: Option<NodeId>,
}

pub struct WhileStatementData {
    pub cond: NodeId,
    pub continue_expr: Option<NodeId>,
    pub body: NodeId,
}

pub struct ForItemData {
    /// A single range item: `start..end`, with the named index payload.
    pub start: NodeId,
    pub end: NodeId,
    pub index_name: StrId,
}

pub struct ForStatementData {
    pub item: Box<ForItemData>,
    pub body: NodeId,
}

pub struct LabeledStatementData {
    pub label: Option<StrId>,
    pub inner: NodeId,
}

pub struct FnCallArgumentsData {
    pub callee: NodeId,
    pub args: Vec<NodeId>,
}

/// `primary_type_expr` leaves (spec §3: raw-buffer | child-node |
/// builtin(name, args), selected by an inner tag).
pub enum PrimaryLeaf {
    NumberLiteral(StrId),
    CharLiteral(StrId),
    StringLiteral(StrId),
    Identifier(StrId),
    Builtin { name: StrId, args: Vec<NodeId> },
    Unreachable,
    GroupedExpr(NodeId),
}

pub struct PrimaryTypeExprData {
    pub leaf: PrimaryLeaf,
}

pub struct PrefixTypeOpData {
    pub kind: PrefixTypeOpKind,
    pub modifiers: u32,
    pub inner: NodeId,
}

pub struct SuffixTypeOpData {
    pub kind: SuffixTypeOpKind,
    pub name: Option<StrId>,
    pub inner: NodeId,
}

pub struct SuffixExprData {
    pub primary: NodeId,
    pub suffixes: Vec<NodeId>,
}

pub struct ContainerDeclData {
    pub kind: ContainerKind,
    pub name: Option<StrId>,
    pub members: NodeId,
}

pub struct ContainerMembersData {
    pub decls: Vec<NodeId>,
    pub fields: Vec<NodeId>,
}

pub struct ContainerFieldData {
    pub name: StrId,
    pub type_expr: Option<NodeId>,
    pub default: Option<NodeId>,
}

pub struct BlockData {
    pub label: Option<StrId>,
    pub statements: Vec<NodeId>,
}

pub struct ReturnExprData {
    pub value: Option<NodeId>,
}

pub struct FieldInitData {
    pub name: StrId,
    pub value: NodeId,
}

pub struct SwitchProngData {
    pub items: Vec<NodeId>,
    pub body: NodeId,
}

pub struct SwitchExprData {
    pub discriminant: NodeId,
    pub prongs: Vec<NodeId>,
}

pub struct AsmExprData {
    pub template: StrId,
    pub outputs: Vec<NodeId>,
    pub inputs: Vec<NodeId>,
}

pub struct IdentifierListData {
    pub names: Vec<StrId>,
}

pub struct InitListData {
    pub kind: InitListKind,
    pub items: Vec<NodeId>,
}

pub struct PayloadData {
    pub names: Vec<StrId>,
}

/// Closed node-tag set (spec §6). Every tag enumerated there has a variant
/// here; tags the lowering pass stubs to an error still need a payload
/// shape so the parser and the AST dump can represent them.
pub enum NodeKind {
    ContainerMembers(Box<ContainerMembersData>),
    ContainerField(Box<ContainerFieldData>),
    TestDecl { name: Option<StrId>, body: NodeId },
    ComptimeDecl { body: NodeId },
    VarDeclProto(Box<VarDeclData>),
    GlobalVarDecl(Box<VarDeclData>),
    DeclFn(Box<DeclFnData>),
    DeclGlobalVarDecl(Box<VarDeclData>),
    Block(Box<BlockData>),
    FnProto(Box<FnProtoData>),
    FnProtoExtra(Box<FnProtoData>),
    ParamDeclList(Vec<NodeId>),
    ParamDecl(Box<ParamDecl>),
    TypeExpr(NodeId),
    ErrorUnionExpr { error_set: Option<NodeId>, payload: NodeId },
    SuffixExpr(Box<SuffixExprData>),
    ComptimeStatement(NodeId),
    NosuspendStatement(NodeId),
    SuspendStatement(NodeId),
    DeferStatement(NodeId),
    ErrdeferStatement { payload: Option<StrId>, body: NodeId },
    UnaryExpr(Box<UnaryExprData>),
    BinaryExpr(Box<BinaryExprData>),
    ComptimeExpr(NodeId),
    NosuspendExpr(NodeId),
    ResumeExpr(NodeId),
    ReturnExpr(Box<ReturnExprData>),
    CurlySuffixExpr { inner: NodeId, init_list: NodeId },
    PrimaryTypeExpr(Box<PrimaryTypeExprData>),
    TopLevelDecl(NodeId),
    ForItem(Box<ForItemData>),
    ForArgs(Vec<NodeId>),
    FieldInit(Box<FieldInitData>),
    StructDecl(Box<ContainerDeclData>),
    OpaqueDecl(Box<ContainerDeclData>),
    EnumDecl(Box<ContainerDeclData>),
    UnionDecl(Box<ContainerDeclData>),
    SwitchItem(NodeId),
    SwitchCase(Box<SwitchProngData>),
    LabeledBlock(Box<BlockData>),
    LabeledLoopExpr(Box<LabeledStatementData>),
    LabeledSwitchExpr(Box<LabeledStatementData>),
    WhileStatement(Box<WhileStatementData>),
    ForStatement(Box<ForStatementData>),
    IfStatement(Box<IfStatementData>),
    LabeledStatement(Box<LabeledStatementData>),
    IfExpr(Box<IfExprData>),
    VarDeclStatement(Box<VarDeclData>),
    SingleAssignExpr(Box<SingleAssignExprData>),
    MultiAssignExpr(Box<MultiAssignExprData>),
    LoopExpr(NodeId),
    ContinueExpr { label: Option<StrId> },
    BreakExpr { label: Option<StrId>, value: Option<NodeId> },
    WhileExpr(Box<WhileStatementData>),
    ForExpr(Box<ForStatementData>),
    LoopStatement(NodeId),
    ContainerDeclAuto(Box<ContainerDeclData>),
    PrefixTypeOp(Box<PrefixTypeOpData>),
    PtrAlignExpr(NodeId),
    ArrayTypeStart { len: NodeId },
    PtrTypeStart { modifiers: u32 },
    SliceTypeStart { modifiers: u32 },
    SuffixTypeOp(Box<SuffixTypeOpData>),
    FnCallArguments(Box<FnCallArgumentsData>),
    ForPrefix(Box<ForItemData>),
    WhilePrefix { cond: NodeId, continue_expr: Option<NodeId> },
    IfPrefix { cond: NodeId, payload: Option<StrId> },
    Payload(Box<PayloadData>),
    PayloadIndex { name: StrId, index: Option<StrId> },
    PayloadList(Box<PayloadData>),
    SwitchProng(Box<SwitchProngData>),
    ForTypeExpr(NodeId),
    SwitchProngList(Vec<NodeId>),
    ContainerDecl(Box<ContainerDeclData>),
    IfTypeExpr(Box<IfExprData>),
    WhileTypeExpr(Box<WhileStatementData>),
    IdentifierList(Box<IdentifierListData>),
    SwitchExpr(Box<SwitchExprData>),
    InitList(Box<InitListData>),
    AsmInputList(Vec<NodeId>),
    AsmOutputList(Vec<NodeId>),
    AsmInputItem { name: StrId, constraint: StrId, expr: NodeId },
    AsmOutputItem { name: StrId, constraint: StrId, binding: Option<StrId> },
    AsmInput(NodeId),
    AsmOutput(NodeId),
    AsmExpr(Box<AsmExprData>),
    TypeOrName(NodeId),
    Invalid,
}

impl NodeKind {
    /// Tag name exactly as enumerated in the closed node-tag set, used by
    /// AST dumps and diagnostics that name "the offending AST tag".
    pub fn tag_name(&self) -> &'static str {
        match self {
            NodeKind::ContainerMembers(_) => "container_members",
            NodeKind::ContainerField(_) => "container_field",
            NodeKind::TestDecl { .. } => "test_decl",
            NodeKind::ComptimeDecl { .. } => "comptime_decl",
            NodeKind::VarDeclProto(_) => "var_decl_proto",
            NodeKind::GlobalVarDecl(_) => "global_var_decl",
            NodeKind::DeclFn(_) => "decl_fn",
            NodeKind::DeclGlobalVarDecl(_) => "decl_global_var_decl",
            NodeKind::Block(_) => "block",
            NodeKind::FnProto(_) => "fn_proto",
            NodeKind::FnProtoExtra(_) => "fn_proto_extra",
            NodeKind::ParamDeclList(_) => "param_decl_list",
            NodeKind::ParamDecl(_) => "param_decl",
            NodeKind::TypeExpr(_) => "type_expr",
            NodeKind::ErrorUnionExpr { .. } => "error_union_expr",
            NodeKind::SuffixExpr(_) => "suffix_expr",
            NodeKind::ComptimeStatement(_) => "comptime_statement",
            NodeKind::NosuspendStatement(_) => "nosuspend_statement",
            NodeKind::SuspendStatement(_) => "suspend_statement",
            NodeKind::DeferStatement(_) => "defer_statement",
            NodeKind::ErrdeferStatement { .. } => "errdefer_statement",
            NodeKind::UnaryExpr(_) => "unary_expr",
            NodeKind::BinaryExpr(_) => "binary_expr",
            NodeKind::ComptimeExpr(_) => "comptime_expr",
            NodeKind::NosuspendExpr(_) => "nosuspend_expr",
            NodeKind::ResumeExpr(_) => "resume_expr",
            NodeKind::ReturnExpr(_) => "return_expr",
            NodeKind::CurlySuffixExpr { .. } => "curly_suffix_expr",
            NodeKind::PrimaryTypeExpr(_) => "primary_type_expr",
            NodeKind::TopLevelDecl(_) => "top_level_decl",
            NodeKind::ForItem(_) => "for_item",
            NodeKind::ForArgs(_) => "for_args",
            NodeKind::FieldInit(_) => "field_init",
            NodeKind::StructDecl(_) => "struct_decl",
            NodeKind::OpaqueDecl(_) => "opaque_decl",
            NodeKind::EnumDecl(_) => "enum_decl",
            NodeKind::UnionDecl(_) => "union_decl",
            NodeKind::SwitchItem(_) => "switch_item",
            NodeKind::SwitchCase(_) => "switch_case",
            NodeKind::LabeledBlock(_) => "labeled_block",
            NodeKind::LabeledLoopExpr(_) => "labeled_loop_expr",
            NodeKind::LabeledSwitchExpr(_) => "labeled_switch_expr",
            NodeKind::WhileStatement(_) => "while_statement",
            NodeKind::ForStatement(_) => "for_statement",
            NodeKind::IfStatement(_) => "if_statement",
            NodeKind::LabeledStatement(_) => "labeled_statement",
            NodeKind::IfExpr(_) => "if_expr",
            NodeKind::VarDeclStatement(_) => "var_decl_statement",
            NodeKind::SingleAssignExpr(_) => "single_assign_expr",
            NodeKind::MultiAssignExpr(_) => "multi_assign_expr",
            NodeKind::LoopExpr(_) => "loop_expr",
            NodeKind::ContinueExpr { .. } => "continue_expr",
            NodeKind::BreakExpr { .. } => "break_expr",
            NodeKind::WhileExpr(_) => "while_expr",
            NodeKind::ForExpr(_) => "for_expr",
            NodeKind::LoopStatement(_) => "loop_statement",
            NodeKind::ContainerDeclAuto(_) => "container_decl_auto",
            NodeKind::PrefixTypeOp(data) => match data.kind {
                PrefixTypeOpKind::Optional => "prefix_type_op_optional",
                PrefixTypeOpKind::Anyframe => "prefix_type_op_anyframe",
                PrefixTypeOpKind::Slice => "prefix_type_op_slice",
                PrefixTypeOpKind::Ptr => "prefix_type_op_ptr",
                PrefixTypeOpKind::Array => "prefix_type_op_array",
            },
            NodeKind::PtrAlignExpr(_) => "ptr_align_expr",
            NodeKind::ArrayTypeStart { .. } => "array_type_start",
            NodeKind::PtrTypeStart { .. } => "ptr_type_start",
            NodeKind::SliceTypeStart { .. } => "slice_type_start",
            NodeKind::SuffixTypeOp(data) => match data.kind {
                SuffixTypeOpKind::Slice => "suffix_type_op_slice",
                SuffixTypeOpKind::NamedAccess => "suffix_type_op_named_access",
                SuffixTypeOpKind::Deref => "suffix_type_op_deref",
                SuffixTypeOpKind::AssertMaybe => "suffix_type_op_assert_maybe",
            },
            NodeKind::FnCallArguments(_) => "fn_call_arguments",
            NodeKind::ForPrefix(_) => "for_prefix",
            NodeKind::WhilePrefix { .. } => "while_prefix",
            NodeKind::IfPrefix { .. } => "if_prefix",
            NodeKind::Payload(_) => "payload",
            NodeKind::PayloadIndex { .. } => "payload_index",
            NodeKind::PayloadList(_) => "payload_list",
            NodeKind::SwitchProng(_) => "switch_prong",
            NodeKind::ForTypeExpr(_) => "for_type_expr",
            NodeKind::SwitchProngList(_) => "switch_prong_list",
            NodeKind::ContainerDecl(_) => "container_decl",
            NodeKind::IfTypeExpr(_) => "if_type_expr",
            NodeKind::WhileTypeExpr(_) => "while_type_expr",
            NodeKind::IdentifierList(_) => "identifier_list",
            NodeKind::SwitchExpr(_) => "switch_expr",
            NodeKind::InitList(data) => match data.kind {
                InitListKind::Field => "init_list_field",
                InitListKind::Expr => "init_list_expr",
                InitListKind::Empty => "init_list_empty",
            },
            NodeKind::AsmInputList(_) => "asm_input_list",
            NodeKind::AsmOutputList(_) => "asm_output_list",
            NodeKind::AsmInputItem { .. } => "asm_input_item",
            NodeKind::AsmOutputItem { .. } => "asm_output_item",
            NodeKind::AsmInput(_) => "asm_input",
            NodeKind::AsmOutput(_) => "asm_output",
            NodeKind::AsmExpr(_) => "asm_expr",
            NodeKind::TypeOrName(_) => "type_or_name",
            NodeKind::Invalid => "invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_ids_are_stable_and_dense() {
        let mut ast = Ast::new();
        let a = ast.push(NodeKind::Invalid, Span { start: 0, end: 0 });
        let b = ast.push(NodeKind::Invalid, Span { start: 1, end: 2 });
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(ast.len(), 2);
    }

    #[test]
    fn binop_precedence_has_eight_levels() {
        let levels: std::collections::HashSet<u8> = [
            BinOp::Add,
            BinOp::Mul,
            BinOp::Eq,
            BinOp::LogicalAnd,
            BinOp::LogicalOr,
            BinOp::Orelse,
            BinOp::Catch,
            BinOp::BitAnd,
        ]
        .iter()
        .map(|op| op.precedence())
        .collect();
        assert_eq!(levels.len(), 8);
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert!(BinOp::Mul.precedence() > BinOp::Add.precedence());
        assert!(BinOp::Add.precedence() > BinOp::LogicalAnd.precedence());
    }

    #[test]
    fn tag_names_match_closed_set_spelling() {
        assert_eq!(NodeKind::Invalid.tag_name(), "invalid");
        assert_eq!(
            NodeKind::ContainerMembers(Box::new(ContainerMembersData {
                decls: vec![],
                fields: vec![],
            }))
            .tag_name(),
            "container_members"
        );
    }
}
