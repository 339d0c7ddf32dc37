//! Static completion snippets: language constructs, procedural blocks, and
//! system tasks. Bodies use LSP snippet syntax; a literal `$` is escaped.

pub struct Snippet {
    pub label: &'static str,
    pub body: &'static str,
    pub description: &'static str,
}

pub const STATIC_SNIPPETS: &[Snippet] = &[
    // CONSTRUCTS
    Snippet {
        label: "module",
        body: "module ${1:name}(\n  ${2:input logic clk},\n  ${3:input logic rst}\n);\n  ${0}\nendmodule : ${1:name}",
        description: "Define a module",
    },
    Snippet {
        label: "program",
        body: "program ${1:name};\n  ${0}\nendprogram : ${1:name}",
        description: "Define a program",
    },
    Snippet {
        label: "class",
        body: "class ${1:name};\n  ${0}\nendclass : ${1:name}",
        description: "Define a class",
    },
    Snippet {
        label: "final",
        body: "final begin\n  ${0}\nend",
        description: "Insert a final block",
    },
    Snippet {
        label: "interface",
        body: "interface ${1:name};\n  ${0}\nendinterface : ${1:name}",
        description: "Define an interface",
    },
    Snippet {
        label: "package",
        body: "package ${1:name};\n  ${0}\nendpackage : ${1:name}",
        description: "Define a package",
    },
    Snippet {
        label: "function",
        body: "function ${1:ret_type} ${2:name}(${3:input});\n  ${0}\nendfunction : ${2:name}",
        description: "Define a function",
    },
    Snippet {
        label: "task",
        body: "task ${1:name}(${2:input});\n  ${0}\nendtask : ${1:name}",
        description: "Define a task",
    },
    Snippet {
        label: "property",
        body: "property ${1:name} (${2:input});\n  ${0}\nendproperty : ${1:name}",
        description: "Define a property",
    },
    Snippet {
        label: "sequence",
        body: "sequence ${1:name} (${2:input1, input2});\n  ${0:input1 or input2};\nendsequence : ${1:name}",
        description: "Define a sequence",
    },
    Snippet {
        label: "assert",
        body: "${1:label}: assert property (${0:expr});",
        description: "Insert an assertion",
    },
    Snippet {
        label: "assume",
        body: "${1:label}: assume property (${0:expr});",
        description: "Insert an assumption",
    },
    Snippet {
        label: "cover",
        body: "${1:label}: cover property (${2:expr}) ${0:statement};",
        description: "Insert a cover",
    },
    Snippet {
        label: "restrict",
        body: "${1:label}: restrict property (${0:expr});",
        description: "Insert a restriction",
    },
    Snippet {
        label: "parameter",
        body: "parameter ${1:type} ${2:name} = ${0:value};",
        description: "Define a parameter",
    },
    Snippet {
        label: "localparam",
        body: "localparam ${1:type} ${2:name} = ${0:value};",
        description: "Define a local parameter",
    },
    Snippet {
        label: "typedef enum",
        body: "typedef enum ${1:name} {\n  ${2:ENUM1},\n  ${3:ENUM2}\n} ${0:enum_type};",
        description: "Define an enum",
    },
    Snippet {
        label: "generate",
        body: "generate\n  ${0}\nendgenerate",
        description: "Generate block",
    },
    Snippet {
        label: "generate",
        body: "genvar ${1:i};\ngenerate\n  for (${1:i} = 0; ${1:i} < ${2:nloop}; ${1:i} = ${1:i} + 1) begin : ${3:block}\n    ${0}\n  end\nendgenerate",
        description: "Generate block with for loop",
    },
    // PROCEDURAL BLOCKS
    Snippet {
        label: "always_comb",
        body: "always_comb begin\n  ${0}\nend",
        description: "Insert always_comb block",
    },
    Snippet {
        label: "always_ff",
        body: "always_ff @(${1:posedge clk}) begin\n  ${0}\nend",
        description: "Insert always_ff block",
    },
    Snippet {
        label: "always",
        body: "always @(${1:posedge clk}) begin\n  ${0}\nend",
        description: "Insert always block",
    },
    Snippet {
        label: "initial",
        body: "initial begin\n  ${0}\nend",
        description: "Insert initial block",
    },
    // SYSTEM TASKS
    Snippet {
        label: "$info",
        body: "\\$info(\"${0:message}\");",
        description: "Insert info message",
    },
    Snippet {
        label: "$warning",
        body: "\\$warning(\"${0:message}\");",
        description: "Insert warning message",
    },
    Snippet {
        label: "$error",
        body: "\\$error(\"${0:message}\");",
        description: "Insert error message",
    },
    Snippet {
        label: "$fatal",
        body: "\\$fatal(\"${0:message}\");",
        description: "Insert fatal message",
    },
    Snippet {
        label: "$display",
        body: "\\$display(\"${0:message}\");",
        description: "Insert display message",
    },
    Snippet {
        label: "$write",
        body: "\\$write(\"${0:message}\");",
        description: "Insert write message",
    },
    Snippet {
        label: "$strobe",
        body: "\\$strobe(\"${0:message}\");",
        description: "Insert strobe message",
    },
    Snippet {
        label: "$monitor",
        body: "\\$monitor(\"${0:message}\");",
        description: "Insert monitor message",
    },
];
