//! Python sources shared by the benchmarks.

static MODULE: &str = r#"
import os
from collections import defaultdict


class Inventory(object):
    """Counts items per category."""

    def __init__(self, name, *items, **options):
        self.name = name
        self.items = defaultdict(list)
        self.verbose = options.get('verbose', False)
        for item in items:
            self.add(item)

    def add(self, item, category=None):
        key = category or item.split(':')[0]
        self.items[key].append(item)
        if self.verbose:
            print('added %s to %s (%d items)' % (item, key, len(self.items[key])))

    def report(self, width=80):
        lines = []
        for key, values in sorted(self.items.items(), key=lambda pair: -len(pair[1])):
            lines.append('%-20s %5d' % (key, len(values)))
        return '\n'.join(line[:width] for line in lines if line)


def load(path):
    with open(os.path.join(path, 'inventory.txt')) as f:
        return Inventory(path, *[line.strip() for line in f if not line.startswith('#')])
"#;

static EXPRESSIONS: &str = "x = a+b*c-(d/e)**f%g\ny = [i for i in range(10) if i%2]\n\
                            z = {'k': v, **rest}\nw = f(a,b , c=1,*args,**kw)[1:n+1]\n";

/// `(name, source)` pairs of increasing size.
pub fn sources() -> Vec<(&'static str, String)> {
    vec![
        ("expressions", EXPRESSIONS.repeat(50)),
        ("module", MODULE.to_owned()),
        ("module_x20", MODULE.repeat(20)),
    ]
}
