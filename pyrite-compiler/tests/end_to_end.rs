//! End-to-end scenarios exercised against the public API of each pass
//! directly, rather than through source text (lexing/parsing are out of
//! scope for this crate).

use inkwell::context::Context;
use pyrite_ast::{
    Block, CompileTimeParam, ConstArg, Enum, EnumVariantDecl, Expr, ExprKind, Function, Item,
    MatchArm, NodeId, Param, Pattern, Program, Stmt, StmtKind, Type,
};
use pyrite_compiler::{BorrowChecker, BorrowError, CodeGenerator, MonomorphizationContext, OwnershipError, OwnershipTracker, TypeChecker, TypeError};
use pyrite_diagnostics::Span;

fn ident(name: &str) -> Expr {
    Expr::new(NodeId(0), Span::unknown(), ExprKind::Ident(name.to_string()))
}

fn borrow(name: &str, mutable: bool) -> Expr {
    Expr::new(
        NodeId(0),
        Span::unknown(),
        ExprKind::Reference {
            mutable,
            expr: Box::new(ident(name)),
        },
    )
}

fn let_stmt(name: &str, ty: Option<Type>, value: Expr) -> Stmt {
    Stmt::new(
        NodeId(0),
        Span::unknown(),
        StmtKind::Let {
            mutable: false,
            name: name.to_string(),
            ty,
            value,
        },
    )
}

fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::new(
        NodeId(0),
        Span::unknown(),
        ExprKind::Call {
            func: Box::new(ident(name)),
            compile_time_args: vec![],
            args,
        },
    )
}

fn int(n: i64) -> Expr {
    Expr::new(NodeId(0), Span::unknown(), ExprKind::IntLiteral(n))
}

fn empty_function(name: &str, body: Vec<Stmt>) -> Function {
    Function {
        attributes: vec![],
        name: name.to_string(),
        type_params: vec![],
        compile_time_params: vec![],
        where_clause: vec![],
        receiver: None,
        params: vec![],
        return_type: None,
        body: Block { statements: body },
        span: Span::unknown(),
    }
}

/// Scenario 1: moving a value into a second binding, then reading the
/// source, is reported as a use-after-move naming the recipient.
#[test]
fn move_diagnosis_names_the_move_target() {
    let f = empty_function(
        "f",
        vec![
            let_stmt("a", Some(Type::String), Expr::new(NodeId(0), Span::unknown(), ExprKind::StringLiteral("x".to_string()))),
            let_stmt("b", None, ident("a")),
            Stmt::new(
                NodeId(0),
                Span::unknown(),
                StmtKind::Expression(call("print", vec![ident("a")])),
            ),
        ],
    );

    let mut tracker = OwnershipTracker::new();
    tracker.check_function(&f);

    assert!(matches!(
        tracker.errors().first(),
        Some(OwnershipError::UseAfterMove { name, moved_into: Some(target), .. })
            if name == "a" && target == "b"
    ));
}

/// Scenario 2: taking an exclusive borrow while a shared borrow of the same
/// variable is still alive is rejected.
#[test]
fn exclusive_borrow_conflicts_with_live_shared_borrow() {
    let f = Function {
        attributes: vec![],
        name: "f".to_string(),
        type_params: vec![],
        compile_time_params: vec![],
        where_clause: vec![],
        receiver: None,
        params: vec![Param {
            name: "xs".to_string(),
            ty: Type::Array {
                element: Box::new(Type::i32()),
                size: 2,
            },
        }],
        return_type: None,
        body: Block {
            statements: vec![
                let_stmt("r", None, borrow("xs", false)),
                let_stmt("m", None, borrow("xs", true)),
            ],
        },
        span: Span::unknown(),
    };

    let mut checker = BorrowChecker::new();
    checker.check_function(&f);

    assert!(matches!(
        checker.errors().first(),
        Some(BorrowError::ExclusiveBorrowWhileAliased { name, .. }) if name == "xs"
    ));
}

/// Scenario 3: a compile-time-parameterized function called with two
/// distinct literal arguments produces exactly two specializations, named
/// by the mangled convention, and the generic original is gone.
#[test]
fn monomorphization_produces_distinct_mangled_specializations() {
    let generic = Function {
        attributes: vec![],
        name: "f".to_string(),
        type_params: vec![],
        compile_time_params: vec![CompileTimeParam::Int("N".to_string())],
        where_clause: vec![],
        receiver: None,
        params: vec![],
        return_type: Some(Type::i32()),
        body: Block {
            statements: vec![Stmt::new(
                NodeId(0),
                Span::unknown(),
                StmtKind::Return(Some(ident("N"))),
            )],
        },
        span: Span::unknown(),
    };

    let call_with = |n: i64| {
        Expr::new(
            NodeId(0),
            Span::unknown(),
            ExprKind::Call {
                func: Box::new(ident("f")),
                compile_time_args: vec![ConstArg::Int(n)],
                args: vec![],
            },
        )
    };

    let mut program = Program {
        imports: vec![],
        items: vec![
            Item::Function(generic),
            Item::Function(empty_function(
                "main",
                vec![
                    Stmt::new(NodeId(0), Span::unknown(), StmtKind::Expression(call_with(3))),
                    Stmt::new(NodeId(0), Span::unknown(), StmtKind::Expression(call_with(4))),
                ],
            )),
        ],
    };

    let mut ctx = MonomorphizationContext::new();
    ctx.run(&mut program);
    assert!(ctx.errors().is_empty());

    let names: Vec<&str> = program
        .items
        .iter()
        .filter_map(|i| match i {
            Item::Function(f) => Some(f.name.as_str()),
            _ => None,
        })
        .collect();
    assert!(names.contains(&"f_3"));
    assert!(names.contains(&"f_4"));
    assert!(!names.contains(&"f"));
}

/// Scenario 4: an enum literal round-trips through codegen as a tagged
/// union — `Option.Some(42)` materializes tag `1` with the payload widened
/// into the shared `i64` slot, and a match on it extracts 42 back out.
#[test]
fn enum_roundtrips_through_tagged_union_layout() {
    let option_enum = Enum {
        name: "Option".to_string(),
        type_params: vec![],
        variants: vec![
            EnumVariantDecl {
                name: "None".to_string(),
                data: vec![],
            },
            EnumVariantDecl {
                name: "Some".to_string(),
                data: vec![Type::i32()],
            },
        ],
        span: Span::unknown(),
    };

    let make_some = Expr::new(
        NodeId(0),
        Span::unknown(),
        ExprKind::EnumLiteral {
            enum_name: "Option".to_string(),
            variant: "Some".to_string(),
            data: vec![int(42)],
        },
    );

    let option_ty = Type::Enum {
        name: "Option".to_string(),
        variants: vec![("None".to_string(), None), ("Some".to_string(), Some(vec![Type::i32()]))],
    };

    let match_expr = Expr::new(
        NodeId(0),
        Span::unknown(),
        ExprKind::Match {
            scrutinee: Box::new(ident("opt")),
            arms: vec![
                MatchArm {
                    pattern: Pattern::Enum {
                        name: "Option".to_string(),
                        variant: "Some".to_string(),
                        data: vec![Pattern::Ident("n".to_string())],
                    },
                    guard: None,
                    body: ident("n"),
                },
                MatchArm {
                    pattern: Pattern::Wildcard,
                    guard: None,
                    body: int(0),
                },
            ],
        },
    );

    let f = Function {
        attributes: vec![],
        name: "f".to_string(),
        type_params: vec![],
        compile_time_params: vec![],
        where_clause: vec![],
        receiver: None,
        params: vec![],
        return_type: Some(Type::i32()),
        body: Block {
            statements: vec![
                let_stmt("opt", Some(option_ty), make_some),
                Stmt::new(NodeId(0), Span::unknown(), StmtKind::Return(Some(match_expr))),
            ],
        },
        span: Span::unknown(),
    };

    let program = Program {
        imports: vec![],
        items: vec![Item::Enum(option_enum), Item::Function(f)],
    };

    let context = Context::create();
    let mut codegen = CodeGenerator::new(&context, "enum_roundtrip");
    codegen.compile_program(&program).expect("codegen should succeed");

    let ir = codegen.print_to_string();
    assert!(ir.contains("define"));
    // The `42` literal is widened into the payload's shared i64 slot on
    // construction, then narrowed back to i32 when the match arm binds `n`.
    assert!(ir.contains("zext i32 42 to i64"), "payload should widen to i64:\n{ir}");
    assert!(ir.contains("trunc i64"), "bound payload should narrow back to i32:\n{ir}");
}

/// Scenario 5: defers run LIFO against whichever exit edge actually fires —
/// an early return inside an `if` only unwinds the defers live at that
/// point, while falling through runs every defer registered in the
/// function.
#[test]
fn defers_run_lifo_on_every_exit_edge() {
    let defer_call = |name: &str| {
        Stmt::new(
            NodeId(0),
            Span::unknown(),
            StmtKind::Defer(Box::new(Stmt::new(
                NodeId(0),
                Span::unknown(),
                StmtKind::Expression(call(name, vec![])),
            ))),
        )
    };

    let f = Function {
        attributes: vec![],
        name: "f".to_string(),
        type_params: vec![],
        compile_time_params: vec![],
        where_clause: vec![],
        receiver: None,
        params: vec![Param {
            name: "early".to_string(),
            ty: Type::Bool,
        }],
        return_type: None,
        body: Block {
            statements: vec![
                defer_call("a"),
                defer_call("b"),
                Stmt::new(
                    NodeId(0),
                    Span::unknown(),
                    StmtKind::If {
                        condition: ident("early"),
                        then_block: Block {
                            statements: vec![Stmt::new(NodeId(0), Span::unknown(), StmtKind::Return(Some(int(0))))],
                        },
                        elif_branches: vec![],
                        else_block: None,
                    },
                ),
                defer_call("c"),
            ],
        },
        span: Span::unknown(),
    };

    let program = Program {
        imports: vec![],
        items: vec![
            Item::Function(declare_noop("a")),
            Item::Function(declare_noop("b")),
            Item::Function(declare_noop("c")),
            Item::Function(f),
        ],
    };

    let context = Context::create();
    let mut codegen = CodeGenerator::new(&context, "defer_order");
    codegen.compile_program(&program).expect("codegen should succeed");

    let ir = codegen.print_to_string();
    let call_b = ir.find("call i32 @b()").expect("b() should be called on the early-return path");
    let call_a = ir.find("call i32 @a()").expect("a() should be called on the early-return path");
    assert!(call_b < call_a, "B must run before A on the return edge (LIFO)");
}

fn declare_noop(name: &str) -> Function {
    empty_function(name, vec![])
}

/// Scenario 6: a `match` over an enum that omits a variant is rejected,
/// naming the missing variant.
#[test]
fn non_exhaustive_match_names_the_missing_variant() {
    let traffic_light = Enum {
        name: "Light".to_string(),
        type_params: vec![],
        variants: vec![
            EnumVariantDecl {
                name: "Red".to_string(),
                data: vec![],
            },
            EnumVariantDecl {
                name: "Yellow".to_string(),
                data: vec![],
            },
            EnumVariantDecl {
                name: "Green".to_string(),
                data: vec![],
            },
        ],
        span: Span::unknown(),
    };

    let light_ty = Type::Enum {
        name: "Light".to_string(),
        variants: vec![
            ("Red".to_string(), None),
            ("Yellow".to_string(), None),
            ("Green".to_string(), None),
        ],
    };

    let match_expr = Expr::new(
        NodeId(0),
        Span::unknown(),
        ExprKind::Match {
            scrutinee: Box::new(ident("light")),
            arms: vec![
                MatchArm {
                    pattern: Pattern::Enum {
                        name: "Light".to_string(),
                        variant: "Red".to_string(),
                        data: vec![],
                    },
                    guard: None,
                    body: int(0),
                },
                MatchArm {
                    pattern: Pattern::Enum {
                        name: "Light".to_string(),
                        variant: "Yellow".to_string(),
                        data: vec![],
                    },
                    guard: None,
                    body: int(1),
                },
            ],
        },
    );

    let f = Function {
        attributes: vec![],
        name: "f".to_string(),
        type_params: vec![],
        compile_time_params: vec![],
        where_clause: vec![],
        receiver: None,
        params: vec![Param {
            name: "light".to_string(),
            ty: light_ty,
        }],
        return_type: Some(Type::i32()),
        body: Block {
            statements: vec![Stmt::new(NodeId(0), Span::unknown(), StmtKind::Return(Some(match_expr)))],
        },
        span: Span::unknown(),
    };

    let program = Program {
        imports: vec![],
        items: vec![Item::Enum(traffic_light), Item::Function(f)],
    };

    let mut checker = TypeChecker::new();
    checker.check_program(&program);

    assert!(matches!(
        checker.errors().first(),
        Some(TypeError::NonExhaustiveMatch { variant, .. }) if variant == "Green"
    ));
}
